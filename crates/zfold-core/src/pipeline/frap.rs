use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::consts::DEFAULT_REPORT_NAME;
use crate::error::{Result, ZfoldError};
use crate::io::roi::RoiCatalog;
use crate::io::ser::SerStack;
use crate::kinetics::report::write_csv;
use crate::kinetics::sampler::{ellipses_by_time, measure_ellipses, Ellipse};
use crate::kinetics::{analyze_series, TimeSeries};
use crate::source::{PlaneSource, ShapeCatalog, TimeSeriesSource};

use super::config::FrapConfig;
use super::orchestrator::{image_name, run_batch};
use super::types::{BatchReport, BatchStage, ImageStatus, NoOpReporter, ProgressReporter};

/// Recovery series of one SER stack: ellipse intensities plus trailer
/// timestamps, or a fixed frame interval when the stack has none.
pub struct SerRecovery<'a> {
    stack: &'a SerStack,
    ellipses: BTreeMap<usize, Ellipse>,
    frame_interval_secs: Option<f64>,
}

impl<'a> SerRecovery<'a> {
    pub fn new(
        stack: &'a SerStack,
        ellipses: BTreeMap<usize, Ellipse>,
        frame_interval_secs: Option<f64>,
    ) -> Self {
        Self {
            stack,
            ellipses,
            frame_interval_secs,
        }
    }
}

impl TimeSeriesSource for SerRecovery<'_> {
    fn timestamps(&self, channel: usize) -> Result<BTreeMap<usize, f64>> {
        if self.stack.has_timestamps() {
            return self.stack.timestamps_secs(channel);
        }
        let interval = self
            .frame_interval_secs
            .ok_or(ZfoldError::MissingTimestamp(0))?;
        Ok((0..self.stack.dims().size_t)
            .map(|t| (t, t as f64 * interval))
            .collect())
    }

    fn intensities(&self, channel: usize) -> Result<BTreeMap<usize, f64>> {
        measure_ellipses(self.stack, &self.ellipses, channel)
    }
}

/// Measure and analyze every input of `config` with a progress reporter.
pub fn run_frap_reported(
    config: &FrapConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BatchReport> {
    config.validate()?;
    let catalog = RoiCatalog::load(&config.rois)?;
    if let Some(dir) = &config.report_dir {
        std::fs::create_dir_all(dir)?;
    }

    info!(
        images = config.inputs.len(),
        channel = config.channel,
        "Starting FRAP batch"
    );

    let report = run_batch(
        &config.inputs,
        config.parallel,
        BatchStage::Measuring,
        &reporter,
        |path| match analyze_file(path, config, &catalog) {
            Ok(status) => status,
            Err(e) => ImageStatus::Failed(e),
        },
    );

    match report.mean_half_time() {
        Some(mean) => info!(mean_half_time = mean, "FRAP batch complete"),
        None => info!("FRAP batch complete, no image analyzed"),
    }
    Ok(report)
}

/// Measure and analyze every input of `config`.
pub fn run_frap(config: &FrapConfig) -> Result<BatchReport> {
    run_frap_reported(config, Arc::new(NoOpReporter))
}

/// Analyze one SER file.
pub fn analyze_file<C: ShapeCatalog + ?Sized>(
    path: &Path,
    config: &FrapConfig,
    catalog: &C,
) -> Result<ImageStatus> {
    let stack = SerStack::open(path, config.layout)?;
    let name = image_name(path);
    let ellipses = ellipses_by_time(&catalog.shapes_for(&name)?);
    info!(image = %name, ellipses = ellipses.len(), "Measuring recovery");

    let recovery = SerRecovery::new(&stack, ellipses, config.frame_interval_secs);
    let series = TimeSeries::from_source(&recovery, config.channel_index())?;
    let result = analyze_series(&series)?;

    info!(
        image = %name,
        bleach_t = result.bleach_time_index,
        bleach_time = result.bleach_timestamp,
        pre_bleach = result.pre_bleach_value,
        bleach = result.bleach_value,
        mobile_fraction = result.mobile_fraction,
        half_time = result.half_time,
        "Recovery analyzed"
    );

    if let Some(dir) = &config.report_dir {
        let csv = dir.join(format!("{name}_{DEFAULT_REPORT_NAME}"));
        write_csv(&csv, &series, &result)?;
    }

    Ok(ImageStatus::Analyzed(result))
}
