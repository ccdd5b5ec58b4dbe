//! Fluorescence recovery after photobleaching (FRAP) analysis.

pub mod report;
pub mod sampler;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, ZfoldError};
use crate::source::TimeSeriesSource;

/// One time point of a recovery curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct KineticsSample {
    pub time_index: usize,
    pub timestamp_secs: f64,
    pub average_intensity: f64,
}

/// Recovery curve ordered by ascending time index.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    samples: Vec<KineticsSample>,
}

impl TimeSeries {
    /// Join the timestamp and intensity maps over `times`.
    ///
    /// Time points without an intensity are left out of the series; a time
    /// point with an intensity but no timestamp is an error.
    pub fn from_maps(
        times: &[usize],
        timestamps: &BTreeMap<usize, f64>,
        intensities: &BTreeMap<usize, f64>,
    ) -> Result<Self> {
        let mut indices = times.to_vec();
        indices.sort_unstable();
        indices.dedup();

        let mut samples = Vec::with_capacity(indices.len());
        for t in indices {
            let Some(&average_intensity) = intensities.get(&t) else {
                debug!(t, "No measurement at time point, skipped");
                continue;
            };
            let timestamp_secs = *timestamps.get(&t).ok_or(ZfoldError::MissingTimestamp(t))?;
            if !average_intensity.is_finite() || !timestamp_secs.is_finite() {
                return Err(ZfoldError::NonFiniteSample(t));
            }
            samples.push(KineticsSample {
                time_index: t,
                timestamp_secs,
                average_intensity,
            });
        }
        Ok(Self { samples })
    }

    /// Build a series from samples in any order. Later duplicates of a time
    /// index replace earlier ones.
    pub fn from_samples(samples: impl IntoIterator<Item = KineticsSample>) -> Result<Self> {
        let by_index: BTreeMap<usize, KineticsSample> =
            samples.into_iter().map(|s| (s.time_index, s)).collect();
        for s in by_index.values() {
            if !s.average_intensity.is_finite() || !s.timestamp_secs.is_finite() {
                return Err(ZfoldError::NonFiniteSample(s.time_index));
            }
        }
        Ok(Self {
            samples: by_index.into_values().collect(),
        })
    }

    /// Pull both maps from a source and join them over every time index
    /// that has a measurement.
    pub fn from_source<S: TimeSeriesSource + ?Sized>(source: &S, channel: usize) -> Result<Self> {
        let intensities = source.intensities(channel)?;
        let timestamps = source.timestamps(channel)?;
        let times: Vec<usize> = intensities.keys().copied().collect();
        Self::from_maps(&times, &timestamps, &intensities)
    }

    pub fn samples(&self) -> &[KineticsSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Recovery parameters of one curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct KineticsResult {
    pub bleach_time_index: usize,
    pub bleach_timestamp: f64,
    pub pre_bleach_value: f64,
    pub bleach_value: f64,
    /// Intensity at the last time point.
    pub recovery_value: f64,
    /// Timestamp of the last time point.
    pub end_timestamp: f64,
    pub mobile_fraction: f64,
    /// Midpoint between bleach and recovery intensity.
    pub half_recovery_value: f64,
    /// Seconds from the bleach to the first sample reaching half recovery.
    pub half_time: f64,
}

/// Analyze a recovery curve given as separate maps keyed by time index.
pub fn analyze(
    times: &[usize],
    timestamps: &BTreeMap<usize, f64>,
    intensities: &BTreeMap<usize, f64>,
) -> Result<KineticsResult> {
    let series = TimeSeries::from_maps(times, timestamps, intensities)?;
    analyze_series(&series)
}

/// Locate the bleach (earliest minimum), then derive mobile fraction and
/// half-time against the last sample.
pub fn analyze_series(series: &TimeSeries) -> Result<KineticsResult> {
    let samples = series.samples();
    if samples.len() < 2 {
        return Err(ZfoldError::InsufficientData(samples.len()));
    }

    // Strict comparison keeps the earliest index on ties.
    let mut bleach_pos = 0;
    for (i, s) in samples.iter().enumerate().skip(1) {
        if s.average_intensity < samples[bleach_pos].average_intensity {
            bleach_pos = i;
        }
    }
    let bleach = samples[bleach_pos];
    if bleach_pos == 0 {
        return Err(ZfoldError::NoPreBleachSample(bleach.time_index));
    }

    let pre_bleach_value = samples[bleach_pos - 1].average_intensity;
    let bleach_value = bleach.average_intensity;
    let last = samples[samples.len() - 1];
    let recovery_value = last.average_intensity;

    let depth = pre_bleach_value - bleach_value;
    if depth == 0.0 {
        return Err(ZfoldError::DegenerateBleach(bleach_value));
    }
    let mobile_fraction = (recovery_value - bleach_value) / depth;

    let half_recovery_value = (recovery_value + bleach_value) / 2.0;
    let reached = samples[bleach_pos..]
        .iter()
        .find(|s| s.average_intensity >= half_recovery_value)
        .ok_or(ZfoldError::RecoveryIncomplete {
            target: half_recovery_value,
        })?;
    let half_time = reached.timestamp_secs - bleach.timestamp_secs;

    debug!(
        bleach_t = bleach.time_index,
        mobile_fraction, half_time, "Recovery analyzed"
    );

    Ok(KineticsResult {
        bleach_time_index: bleach.time_index,
        bleach_timestamp: bleach.timestamp_secs,
        pre_bleach_value,
        bleach_value,
        recovery_value,
        end_timestamp: last.timestamp_secs,
        mobile_fraction,
        half_recovery_value,
        half_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: usize, v: f64) -> KineticsSample {
        KineticsSample {
            time_index: t,
            timestamp_secs: t as f64,
            average_intensity: v,
        }
    }

    #[test]
    fn test_from_samples_sorts_by_index() {
        let series = TimeSeries::from_samples([sample(2, 3.0), sample(0, 1.0), sample(1, 2.0)])
            .unwrap();
        let order: Vec<usize> = series.samples().iter().map(|s| s.time_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_bleach_tie_takes_earliest() {
        let series = TimeSeries::from_samples([
            sample(0, 10.0),
            sample(1, 2.0),
            sample(2, 2.0),
            sample(3, 6.0),
        ])
        .unwrap();
        let r = analyze_series(&series).unwrap();
        assert_eq!(r.bleach_time_index, 1);
        assert_eq!(r.pre_bleach_value, 10.0);
    }

    #[test]
    fn test_nan_rejected() {
        let err = TimeSeries::from_samples([sample(0, 1.0), sample(1, f64::NAN)]).unwrap_err();
        assert!(matches!(err, ZfoldError::NonFiniteSample(1)));
    }
}
