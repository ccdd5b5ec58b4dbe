use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZfoldError};
use crate::io::image_io::PlaneFormat;
use crate::io::ser::StackLayout;
use crate::project::ProjectionMethod;

use super::orchestrator::image_name;

/// Batch Z-projection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    /// Z/C/T layout of every input. Without one each frame is a Z plane.
    #[serde(default)]
    pub layout: Option<StackLayout>,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Process images on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default)]
    pub method: ProjectionMethod,
    /// First Z plane, 1-based. Defaults to the first plane.
    #[serde(default)]
    pub first_z: Option<usize>,
    /// Last Z plane, 1-based inclusive. Defaults to the last plane.
    #[serde(default)]
    pub last_z: Option<usize>,
    /// Project only inside rectangular ROIs; images without one are skipped.
    #[serde(default)]
    pub roi_only: bool,
    /// ROI catalog (TOML). Required when `roi_only` is set.
    #[serde(default)]
    pub rois: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Where projected planes go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// One 16-bit SER stack per region.
    #[default]
    Ser,
    /// One 16-bit TIFF per (region, c, t).
    Tiff,
    /// One 8-bit PNG per (region, c, t).
    Png,
}

impl OutputFormat {
    /// Per-plane image format, `None` for SER stacks.
    pub fn plane_format(&self) -> Option<PlaneFormat> {
        match self {
            Self::Ser => None,
            Self::Tiff => Some(PlaneFormat::Tiff),
            Self::Png => Some(PlaneFormat::Png),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ser => write!(f, "SER stack"),
            Self::Tiff => write!(f, "TIFF planes"),
            Self::Png => write!(f, "PNG planes"),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from("stack.ser")],
            output_dir: PathBuf::from("projections"),
            layout: None,
            projection: ProjectionConfig::default(),
            output: OutputConfig::default(),
            parallel: false,
        }
    }
}

impl ProjectConfig {
    pub fn validate(&self) -> Result<()> {
        check_inputs(&self.inputs)?;
        if self.projection.roi_only && self.projection.rois.is_none() {
            return Err(ZfoldError::Config(
                "roi_only requires an ROI catalog (projection.rois)".into(),
            ));
        }
        if let (Some(first), Some(last)) = (self.projection.first_z, self.projection.last_z) {
            if first == 0 || first > last {
                return Err(ZfoldError::Config(format!(
                    "Invalid Z range {first}..={last}"
                )));
            }
        }
        Ok(())
    }
}

/// Batch FRAP analysis settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrapConfig {
    pub inputs: Vec<PathBuf>,
    /// ROI catalog holding one ellipse per time point for each image.
    pub rois: PathBuf,
    #[serde(default)]
    pub layout: Option<StackLayout>,
    /// Channel to analyze, 1-based.
    #[serde(default = "default_channel")]
    pub channel: usize,
    /// Seconds between time points, used when the stack has no timestamps.
    #[serde(default)]
    pub frame_interval_secs: Option<f64>,
    /// Directory for per-image CSV reports. No reports when unset.
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
    #[serde(default)]
    pub parallel: bool,
}

fn default_channel() -> usize {
    1
}

impl Default for FrapConfig {
    fn default() -> Self {
        Self {
            inputs: vec![PathBuf::from("frap.ser")],
            rois: PathBuf::from("rois.toml"),
            layout: None,
            channel: default_channel(),
            frame_interval_secs: None,
            report_dir: None,
            parallel: false,
        }
    }
}

impl FrapConfig {
    pub fn validate(&self) -> Result<()> {
        check_inputs(&self.inputs)?;
        if self.channel == 0 {
            return Err(ZfoldError::Config("Channel index is 1-based".into()));
        }
        if let Some(dt) = self.frame_interval_secs {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(ZfoldError::Config(format!(
                    "Frame interval must be positive, got {dt}"
                )));
            }
        }
        Ok(())
    }

    /// Zero-based channel index.
    pub fn channel_index(&self) -> usize {
        self.channel.saturating_sub(1)
    }
}

/// Inputs must be non-empty and have distinct file stems, since the stem
/// keys both the ROI catalog and the output names.
fn check_inputs(inputs: &[PathBuf]) -> Result<()> {
    if inputs.is_empty() {
        return Err(ZfoldError::Config("No input files".into()));
    }
    let mut seen: BTreeMap<String, &Path> = BTreeMap::new();
    for input in inputs {
        if let Some(first) = seen.insert(image_name(input), input.as_path()) {
            return Err(ZfoldError::Config(format!(
                "Inputs {} and {} share the image name {}",
                first.display(),
                input.display(),
                image_name(input)
            )));
        }
    }
    Ok(())
}

/// Read a TOML config file.
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| {
        ZfoldError::Config(format!("Invalid config {}: {e}", path.display()))
    })
}
