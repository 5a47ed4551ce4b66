//! Calibration and lever analysis error types.

use crate::common::ErrorSeverity;

/// Calibration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    /// Too few sweep samples survived to analyze the lever
    #[error("insufficient samples: got {got}, need at least {required}")]
    InsufficientSamples {
        /// Samples collected
        got: usize,
        /// Minimum required
        required: usize,
    },

    /// The sweep never moved the sensor
    #[error("calibration range is empty (min == max == {0})")]
    EmptyRange(u16),

    /// The calibration session was already finished or dropped
    #[error("calibration session closed")]
    SessionClosed,

    /// The analyzer could not talk to the simulator at all
    #[error("simulator unavailable during analysis: {0}")]
    SimulatorUnavailable(String),
}

impl CalibrationError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CalibrationError::SessionClosed => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}
