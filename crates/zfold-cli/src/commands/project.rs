use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use tracing::debug;
use zfold_core::io::ser::StackLayout;
use zfold_core::pipeline::config::{load_config, OutputFormat, ProjectConfig};
use zfold_core::pipeline::run_projection_reported;
use zfold_core::project::ProjectionMethod;

use super::parse_layout;
use crate::progress::BarReporter;
use crate::summary::{print_batch_report, print_projection_summary};

#[derive(Clone, Debug, ValueEnum)]
pub enum MethodArg {
    Max,
    Min,
    Sum,
    Mean,
}

impl From<&MethodArg> for ProjectionMethod {
    fn from(arg: &MethodArg) -> Self {
        match arg {
            MethodArg::Max => ProjectionMethod::Maximum,
            MethodArg::Min => ProjectionMethod::Minimum,
            MethodArg::Sum => ProjectionMethod::Sum,
            MethodArg::Mean => ProjectionMethod::Mean,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum FormatArg {
    Ser,
    Tiff,
    Png,
}

impl From<&FormatArg> for OutputFormat {
    fn from(arg: &FormatArg) -> Self {
        match arg {
            FormatArg::Ser => OutputFormat::Ser,
            FormatArg::Tiff => OutputFormat::Tiff,
            FormatArg::Png => OutputFormat::Png,
        }
    }
}

/// Flags given on the command line override the matching `--config` entries.
#[derive(Args, Debug, Default)]
pub struct ProjectArgs {
    /// Input SER files (replace the config's inputs)
    pub files: Vec<PathBuf>,

    /// Projection config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Projection method [default: max]
    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// First Z plane, 1-based
    #[arg(long)]
    pub first_z: Option<usize>,

    /// Last Z plane, 1-based inclusive
    #[arg(long)]
    pub last_z: Option<usize>,

    /// Project only inside rectangular ROIs
    #[arg(long)]
    pub roi_only: bool,

    /// ROI catalog (TOML)
    #[arg(long)]
    pub rois: Option<PathBuf>,

    /// Stack layout as ZxCxT (default: every frame is a Z plane)
    #[arg(long, value_parser = parse_layout)]
    pub layout: Option<StackLayout>,

    /// Output format [default: ser]
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Process images in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Output directory [default: projections]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &ProjectArgs) -> Result<()> {
    let config = resolve_config(args)?;

    debug!(?config, "Resolved projection config");
    print_projection_summary(&config);

    let reporter = Arc::new(BarReporter::new()?);
    let report = run_projection_reported(&config, reporter)?;

    print_batch_report(&report);

    let summary = report.summary();
    if summary.failed > 0 {
        bail!("{} of {} images failed", summary.failed, report.images.len());
    }
    Ok(())
}

/// Start from `--config` (or the defaults) and apply the command-line flags.
fn resolve_config(args: &ProjectArgs) -> Result<ProjectConfig> {
    let mut config = match args.config {
        Some(ref path) => load_config::<ProjectConfig>(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProjectConfig {
            inputs: Vec::new(),
            ..ProjectConfig::default()
        },
    };

    if !args.files.is_empty() {
        config.inputs = args.files.clone();
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }
    if args.layout.is_some() {
        config.layout = args.layout;
    }
    if let Some(ref method) = args.method {
        config.projection.method = method.into();
    }
    if args.first_z.is_some() {
        config.projection.first_z = args.first_z;
    }
    if args.last_z.is_some() {
        config.projection.last_z = args.last_z;
    }
    if args.rois.is_some() {
        config.projection.rois = args.rois.clone();
    }
    config.projection.roi_only |= args.roi_only;
    if let Some(ref format) = args.format {
        config.output.format = format.into();
    }
    config.parallel |= args.parallel;

    Ok(config)
}
