use std::path::PathBuf;

use crate::error::ZfoldError;
use crate::kinetics::KineticsResult;

/// Batch processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum BatchStage {
    Projecting,
    Measuring,
}

impl std::fmt::Display for BatchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Projecting => write!(f, "Projecting images"),
            Self::Measuring => write!(f, "Measuring recovery"),
        }
    }
}

/// What happened to one image of a batch.
#[derive(Debug)]
pub enum ImageStatus {
    Projected { planes: usize, outputs: Vec<PathBuf> },
    Analyzed(KineticsResult),
    Skipped(String),
    Failed(ZfoldError),
}

#[derive(Debug)]
pub struct ImageReport {
    pub image: String,
    pub input: PathBuf,
    pub status: ImageStatus,
}

/// Per-image outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub images: Vec<ImageReport>,
}

/// Counts of image outcomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for report in &self.images {
            match report.status {
                ImageStatus::Projected { .. } | ImageStatus::Analyzed(_) => {
                    summary.succeeded += 1
                }
                ImageStatus::Skipped(_) => summary.skipped += 1,
                ImageStatus::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// Mean half-time over every analyzed image.
    pub fn mean_half_time(&self) -> Option<f64> {
        let half_times: Vec<f64> = self
            .images
            .iter()
            .filter_map(|r| match &r.status {
                ImageStatus::Analyzed(result) => Some(result.half_time),
                _ => None,
            })
            .collect();
        if half_times.is_empty() {
            None
        } else {
            Some(half_times.iter().sum::<f64>() / half_times.len() as f64)
        }
    }
}

/// Thread-safe progress reporting for batch runs.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of images.
    fn begin_stage(&self, _stage: BatchStage, _total_items: Option<usize>) {}

    /// One image within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when the unreported entry points delegate.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
