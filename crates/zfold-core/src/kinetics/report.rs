use std::fmt::Write as _;
use std::path::Path;

use tracing::info;

use crate::error::Result;

use super::{KineticsResult, TimeSeries};

/// Render the recovery curve and its parameters as CSV.
///
/// The first two rows hold the timestamps and the intensities, one column per
/// time point; the last two hold the half-time and the mobile fraction.
pub fn render_csv(series: &TimeSeries, result: &KineticsResult) -> String {
    let times: Vec<String> = series
        .samples()
        .iter()
        .map(|s| s.timestamp_secs.to_string())
        .collect();
    let values: Vec<String> = series
        .samples()
        .iter()
        .map(|s| s.average_intensity.to_string())
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "Time (secs),{}", times.join(","));
    let _ = writeln!(out, "Average pixel value,{}", values.join(","));
    let _ = writeln!(out, "tHalf (secs),{:.2}", result.half_time);
    let _ = writeln!(out, "mobileFraction,{:.2}", result.mobile_fraction);
    out
}

/// Write the CSV report to `path`.
pub fn write_csv(path: &Path, series: &TimeSeries, result: &KineticsResult) -> Result<()> {
    std::fs::write(path, render_csv(series, result))?;
    info!(output = %path.display(), "Recovery report saved");
    Ok(())
}
