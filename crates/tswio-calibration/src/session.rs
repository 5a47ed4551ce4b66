//! Interactive calibration sweep

use crate::{
    Calibration, CalibrationError, CalibrationResult, ROLLOVER_FULL_SCALE_FRACTION,
    SweepAnalysis, analyze_sweep, sweep::successive_deltas,
};

/// Minimum samples needed before a session can produce a calibration.
pub const MIN_SESSION_SAMPLES: usize = 2;

/// Collects raw readings from one input while the user moves the lever from
/// the start to the end of its travel.
///
/// Samples must arrive in travel order. [`finish`](Self::finish) consumes the
/// session, so a finished session cannot be fed again.
#[derive(Debug, Clone)]
pub struct CalibrationSession {
    samples: Vec<i32>,
    max_hardware_value: u16,
}

impl CalibrationSession {
    pub fn new(max_hardware_value: u16) -> Self {
        Self {
            samples: Vec::new(),
            max_hardware_value,
        }
    }

    pub fn add_sample(&mut self, raw: i32) {
        self.samples.push(raw);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn analysis(&self) -> SweepAnalysis {
        analyze_sweep(&self.samples, self.max_hardware_value)
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Build the calibration from the collected sweep.
    ///
    /// Readings are unwrapped across the sensor's wrap point so the extremes
    /// of travel are found along the actual path of the lever.
    pub fn finish(self) -> CalibrationResult<Calibration> {
        if self.samples.len() < MIN_SESSION_SAMPLES {
            return Err(CalibrationError::InsufficientSamples {
                got: self.samples.len(),
                required: MIN_SESSION_SAMPLES,
            });
        }

        let analysis = self.analysis();
        let modulus = i64::from(self.max_hardware_value) + 1;
        let wrap_jump = ROLLOVER_FULL_SCALE_FRACTION * f64::from(self.max_hardware_value);

        let first = self.samples.first().copied().map(i64::from).unwrap_or(0);
        let mut position = first;
        let mut lowest = first;
        let mut highest = first;
        for delta in successive_deltas(&self.samples) {
            let step = if !analysis.rollover {
                delta
            } else if delta as f64 > wrap_jump {
                delta - modulus
            } else if (delta as f64) < -wrap_jump {
                delta + modulus
            } else {
                delta
            };
            position += step;
            lowest = lowest.min(position);
            highest = highest.max(position);
        }

        let (start, end) = if analysis.inverted {
            (highest, lowest)
        } else {
            (lowest, highest)
        };
        let to_raw = |unwrapped: i64| {
            let wrapped = if analysis.rollover {
                unwrapped.rem_euclid(modulus)
            } else {
                unwrapped.clamp(0, i64::from(self.max_hardware_value))
            };
            u16::try_from(wrapped).unwrap_or(self.max_hardware_value)
        };

        Calibration::new(
            to_raw(start),
            to_raw(end),
            self.max_hardware_value,
            analysis.inverted,
            analysis.rollover,
        )
    }
}
