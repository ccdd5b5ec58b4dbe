use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::consts::PARALLEL_IMAGE_THRESHOLD;
use crate::error::{Result, ZfoldError};
use crate::io::image_io::ImageStackWriter;
use crate::io::roi::RoiCatalog;
use crate::io::ser::SerStack;
use crate::io::ser_writer::SerStackWriter;
use crate::plane::StackDims;
use crate::project::{project_into, ProjectionOutcome, ProjectionSpec};
use crate::region::select_regions;
use crate::source::{PlaneSource, ShapeCatalog, StackWriter};

use super::config::{OutputFormat, ProjectConfig};
use super::types::{
    BatchReport, BatchStage, ImageReport, ImageStatus, NoOpReporter, ProgressReporter,
};

/// Image name used for ROI lookup and output naming: the file stem.
pub fn image_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Run `per_image` over every input, sequentially or on the rayon pool,
/// keeping input order in the report.
pub(super) fn run_batch<F>(
    inputs: &[PathBuf],
    parallel: bool,
    stage: BatchStage,
    reporter: &Arc<dyn ProgressReporter>,
    per_image: F,
) -> BatchReport
where
    F: Fn(&Path) -> ImageStatus + Sync,
{
    reporter.begin_stage(stage, Some(inputs.len()));
    let done = AtomicUsize::new(0);
    let run_one = |path: &PathBuf| {
        let status = per_image(path.as_path());
        match &status {
            ImageStatus::Failed(e) => warn!(input = %path.display(), error = %e, "Image failed"),
            ImageStatus::Skipped(reason) => {
                info!(input = %path.display(), %reason, "Image skipped")
            }
            _ => {}
        }
        reporter.advance(done.fetch_add(1, Ordering::Relaxed) + 1);
        ImageReport {
            image: image_name(path),
            input: path.clone(),
            status,
        }
    };

    let images: Vec<ImageReport> = if parallel && inputs.len() >= PARALLEL_IMAGE_THRESHOLD {
        inputs.par_iter().map(run_one).collect()
    } else {
        inputs.iter().map(run_one).collect()
    };
    reporter.finish_stage();

    BatchReport { images }
}

/// Project every input of `config` with a thread-safe progress reporter.
///
/// A failing image is recorded in the report and the batch continues.
pub fn run_projection_reported(
    config: &ProjectConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BatchReport> {
    config.validate()?;
    std::fs::create_dir_all(&config.output_dir)?;

    let catalog = match &config.projection.rois {
        Some(path) => RoiCatalog::load(path)?,
        None => RoiCatalog::default(),
    };

    info!(
        images = config.inputs.len(),
        method = %config.projection.method,
        roi_only = config.projection.roi_only,
        output = %config.output_dir.display(),
        "Starting projection batch"
    );

    let report = run_batch(
        &config.inputs,
        config.parallel,
        BatchStage::Projecting,
        &reporter,
        |path| match project_file(path, config, &catalog) {
            Ok(status) => status,
            Err(e) => ImageStatus::Failed(e),
        },
    );

    let summary = report.summary();
    info!(
        projected = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        "Projection batch complete"
    );
    Ok(report)
}

/// Project every input of `config`.
pub fn run_projection(config: &ProjectConfig) -> Result<BatchReport> {
    run_projection_reported(config, Arc::new(NoOpReporter))
}

/// Project one SER file according to `config`.
pub fn project_file<C: ShapeCatalog + ?Sized>(
    path: &Path,
    config: &ProjectConfig,
    catalog: &C,
) -> Result<ImageStatus> {
    let stack = SerStack::open(path, config.layout)?;
    let name = image_name(path);
    project_source(&stack, &name, config, catalog)
}

/// Select regions, resolve the Z range and project one stack into the configured
/// output format.
pub fn project_source<S, C>(
    source: &S,
    name: &str,
    config: &ProjectConfig,
    catalog: &C,
) -> Result<ImageStatus>
where
    S: PlaneSource + ?Sized,
    C: ShapeCatalog + ?Sized,
{
    let dims = source.dims();
    let shapes = if config.projection.roi_only {
        catalog.shapes_for(name)?
    } else {
        Vec::new()
    };

    let regions = match select_regions(&dims, config.projection.roi_only, &shapes) {
        Ok(regions) => regions,
        Err(ZfoldError::NoUsableRegion) => {
            return Ok(ImageStatus::Skipped("no rectangular ROI".into()));
        }
        Err(e) => return Err(e),
    };

    let spec = ProjectionSpec::new(
        config.projection.method,
        config.projection.first_z,
        config.projection.last_z,
        regions,
        &dims,
    )?;

    let stem = format!("{}_{}", name, spec.method.suffix());
    let mut writer = make_writer(config, &stem, &dims, spec.regions.len());

    match project_into(source, &spec, writer.as_mut())? {
        ProjectionOutcome::Completed { planes } => Ok(ImageStatus::Projected {
            planes,
            outputs: writer.outputs(),
        }),
        ProjectionOutcome::Skipped(reason) => Ok(ImageStatus::Skipped(reason.to_string())),
    }
}

/// Stack writer that can list the files it produced.
trait OutputWriter: StackWriter {
    fn outputs(&self) -> Vec<PathBuf>;
}

impl OutputWriter for SerStackWriter {
    fn outputs(&self) -> Vec<PathBuf> {
        self.written().to_vec()
    }
}

impl OutputWriter for ImageStackWriter {
    fn outputs(&self) -> Vec<PathBuf> {
        self.written().to_vec()
    }
}

fn make_writer(
    config: &ProjectConfig,
    stem: &str,
    dims: &StackDims,
    region_count: usize,
) -> Box<dyn OutputWriter> {
    match config.output.format {
        OutputFormat::Ser => Box::new(SerStackWriter::new(
            &config.output_dir,
            stem,
            dims.size_c,
            dims.size_t,
            region_count,
        )),
        OutputFormat::Tiff | OutputFormat::Png => {
            let format = config.output.format.plane_format().unwrap_or_default();
            Box::new(ImageStackWriter::new(
                &config.output_dir,
                stem,
                format,
                region_count,
            ))
        }
    }
}
