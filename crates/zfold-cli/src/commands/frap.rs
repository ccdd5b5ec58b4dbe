use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::debug;
use zfold_core::io::ser::StackLayout;
use zfold_core::pipeline::config::{load_config, FrapConfig};
use zfold_core::pipeline::run_frap_reported;

use super::parse_layout;
use crate::progress::BarReporter;
use crate::summary::{print_batch_report, print_frap_summary};

/// Flags given on the command line override the matching `--config` entries.
#[derive(Args, Debug, Default)]
pub struct FrapArgs {
    /// Input SER files (replace the config's inputs)
    pub files: Vec<PathBuf>,

    /// FRAP config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// ROI catalog (TOML) with one ellipse per time point
    #[arg(long, required_unless_present = "config")]
    pub rois: Option<PathBuf>,

    /// Channel to analyze, 1-based [default: 1]
    #[arg(long)]
    pub channel: Option<usize>,

    /// Seconds between time points when the stack has no timestamps
    #[arg(long)]
    pub interval: Option<f64>,

    /// Stack layout as ZxCxT (default: every frame is a Z plane)
    #[arg(long, value_parser = parse_layout)]
    pub layout: Option<StackLayout>,

    /// Directory for per-image CSV reports
    #[arg(short, long)]
    pub report_dir: Option<PathBuf>,

    /// Process images in parallel
    #[arg(long)]
    pub parallel: bool,
}

pub fn run(args: &FrapArgs) -> Result<()> {
    let config = resolve_config(args)?;

    debug!(?config, "Resolved FRAP config");
    print_frap_summary(&config);

    let reporter = Arc::new(BarReporter::new()?);
    let report = run_frap_reported(&config, reporter)?;

    print_batch_report(&report);

    match report.mean_half_time() {
        Some(mean) => println!("Average tHalf: {:.2} s", mean),
        None => println!("Average tHalf: n/a"),
    }

    let summary = report.summary();
    if summary.failed > 0 {
        bail!("{} of {} images failed", summary.failed, report.images.len());
    }
    Ok(())
}

/// Start from `--config` (or the defaults) and apply the command-line flags.
fn resolve_config(args: &FrapArgs) -> Result<FrapConfig> {
    let mut config = match args.config {
        Some(ref path) => load_config::<FrapConfig>(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let Some(ref rois) = args.rois else {
                bail!("--rois is required without --config");
            };
            FrapConfig {
                inputs: Vec::new(),
                rois: rois.clone(),
                ..FrapConfig::default()
            }
        }
    };

    if !args.files.is_empty() {
        config.inputs = args.files.clone();
    }
    if let Some(ref rois) = args.rois {
        config.rois = rois.clone();
    }
    if args.layout.is_some() {
        config.layout = args.layout;
    }
    if let Some(channel) = args.channel {
        config.channel = channel;
    }
    if args.interval.is_some() {
        config.frame_interval_secs = args.interval;
    }
    if args.report_dir.is_some() {
        config.report_dir = args.report_dir.clone();
    }
    config.parallel |= args.parallel;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rois_required_without_config() {
        let args = FrapArgs {
            files: vec![PathBuf::from("frap.ser")],
            ..FrapArgs::default()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frap.toml");
        std::fs::write(
            &path,
            r#"
inputs = ["from_config.ser"]
rois = "config_rois.toml"
channel = 2
frame_interval_secs = 0.5
"#,
        )
        .unwrap();

        let args = FrapArgs {
            config: Some(path.clone()),
            ..FrapArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.inputs, vec![PathBuf::from("from_config.ser")]);
        assert_eq!(config.channel, 2);

        let args = FrapArgs {
            files: vec![PathBuf::from("cli.ser")],
            config: Some(path),
            channel: Some(1),
            report_dir: Some(PathBuf::from("reports")),
            parallel: true,
            ..FrapArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.inputs, vec![PathBuf::from("cli.ser")]);
        assert_eq!(config.channel, 1);
        assert_eq!(config.rois, PathBuf::from("config_rois.toml"));
        assert_eq!(config.frame_interval_secs, Some(0.5));
        assert_eq!(config.report_dir, Some(PathBuf::from("reports")));
        assert!(config.parallel);
    }
}
