pub mod config;
mod frap;
mod orchestrator;
mod types;

pub use frap::{analyze_file, run_frap, run_frap_reported, SerRecovery};
pub use orchestrator::{
    image_name, project_file, project_source, run_projection, run_projection_reported,
};
pub use types::{
    BatchReport, BatchStage, BatchSummary, ImageReport, ImageStatus, ProgressReporter,
};
