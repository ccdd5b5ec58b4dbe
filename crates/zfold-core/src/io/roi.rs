use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZfoldError};
use crate::region::Shape;
use crate::source::ShapeCatalog;

/// ROI shapes per image, loaded from TOML.
///
/// ```toml
/// [[images.cells_01]]
/// kind = "rectangle"
/// x = 10.0
/// y = 12.5
/// width = 64.0
/// height = 48.0
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiCatalog {
    #[serde(default)]
    pub images: BTreeMap<String, Vec<Shape>>,
}

impl RoiCatalog {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ZfoldError::Config(format!("Invalid ROI file: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ZfoldError::Config(e.to_string()))
    }
}

impl ShapeCatalog for RoiCatalog {
    fn shapes_for(&self, image: &str) -> Result<Vec<Shape>> {
        Ok(self.images.get(image).cloned().unwrap_or_default())
    }
}
