use std::path::PathBuf;

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Args;
use zfold_core::io::roi::RoiCatalog;
use zfold_core::pipeline::config::{FrapConfig, ProjectConfig};
use zfold_core::region::Shape;

#[derive(Args)]
pub struct ConfigArgs {
    /// Print a FRAP analysis config instead of a projection config
    #[arg(long, conflicts_with = "rois")]
    pub frap: bool,

    /// Print a sample ROI catalog instead of a projection config
    #[arg(long)]
    pub rois: bool,

    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a default ProjectConfig, FrapConfig or ROI catalog as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let toml_str = if args.frap {
        toml::to_string_pretty(&FrapConfig::default())?
    } else if args.rois {
        sample_rois().to_toml_string()?
    } else {
        toml::to_string_pretty(&ProjectConfig::default())?
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}

/// One rectangle for a projection image and a short ellipse track for a
/// FRAP image.
fn sample_rois() -> RoiCatalog {
    let mut images = BTreeMap::new();
    images.insert(
        "stack".to_string(),
        vec![Shape::Rectangle {
            x: 0.0,
            y: 0.0,
            width: 64.0,
            height: 64.0,
        }],
    );
    images.insert(
        "frap".to_string(),
        (0..3)
            .map(|t| Shape::Ellipse {
                cx: 32.0,
                cy: 32.0,
                rx: 8.0,
                ry: 8.0,
                z: 0,
                t,
            })
            .collect(),
    );
    RoiCatalog { images }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rois_parse_back() {
        let toml_str = sample_rois().to_toml_string().unwrap();
        let catalog = RoiCatalog::from_toml_str(&toml_str).unwrap();
        assert_eq!(catalog, sample_rois());
        assert_eq!(catalog.images["frap"].len(), 3);
    }
}
