//! Direction and wrap-around detection over a raw sweep

use serde::{Deserialize, Serialize};

/// Floor for the "large jump" test so a perfectly smooth sweep with tiny
/// steps does not flag ordinary travel as rollover.
pub const ROLLOVER_ABSOLUTE_FLOOR: f64 = 10.0;

/// A jump must exceed this multiple of the median step.
pub const ROLLOVER_MEDIAN_FACTOR: f64 = 3.0;

/// A jump must also exceed this fraction of the sensor's full scale.
pub const ROLLOVER_FULL_SCALE_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SweepAnalysis {
    pub inverted: bool,
    pub rollover: bool,
}

/// Infer direction and wrap-around from raw samples taken while the lever is
/// swept from its start to its end of travel.
///
/// Uses medians so a few noisy steps cannot flip the verdict. Fewer than two
/// samples yield the default (not inverted, no rollover).
///
/// ```
/// use tswio_calibration::analyze_sweep;
///
/// let analysis = analyze_sweep(&[150, 100, 50, 10], 1023);
/// assert!(analysis.inverted);
/// assert!(!analysis.rollover);
/// ```
pub fn analyze_sweep(samples: &[i32], max_hardware_value: u16) -> SweepAnalysis {
    let deltas = successive_deltas(samples);
    if deltas.is_empty() {
        return SweepAnalysis::default();
    }

    let inverted = median(&deltas).is_some_and(|m| m < 0.0);

    let magnitudes: Vec<i64> = deltas.iter().map(|d| d.abs()).collect();
    let median_step = median(&magnitudes).unwrap_or(0.0);
    let largest = magnitudes.iter().copied().max().unwrap_or(0) as f64;
    let jump_threshold = (ROLLOVER_MEDIAN_FACTOR * median_step).max(ROLLOVER_ABSOLUTE_FLOOR);
    let wrap_threshold = ROLLOVER_FULL_SCALE_FRACTION * f64::from(max_hardware_value);
    let rollover = largest > jump_threshold && largest > wrap_threshold;

    SweepAnalysis { inverted, rollover }
}

pub(crate) fn successive_deltas(samples: &[i32]) -> Vec<i64> {
    samples
        .windows(2)
        .filter_map(|pair| match pair {
            [a, b] => Some(i64::from(*b) - i64::from(*a)),
            _ => None,
        })
        .collect()
}

/// Median, averaging the two middle values for an even count.
pub(crate) fn median(values: &[i64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted.get(mid).map(|v| *v as f64)
    } else {
        let upper = sorted.get(mid)?;
        let lower = sorted.get(mid.checked_sub(1)?)?;
        Some((*lower as f64 + *upper as f64) / 2.0)
    }
}
