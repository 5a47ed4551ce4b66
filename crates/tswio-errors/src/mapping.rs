//! Lever mapping error types.
//!
//! All of these mean the lever's notch table does not cover the hardware
//! position; the lever simply produces no output until it is recalibrated.

use crate::common::ErrorSeverity;

/// Lever mapping errors.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MappingError {
    /// No notch contains the hardware value
    #[error("no notch covers hardware value {0}")]
    NoNotch(f64),

    /// The notch has no hardware input range
    #[error("notch {0} has no hardware input range")]
    UnmappedNotch(u32),

    /// The notch has no simulator input range
    #[error("notch {0} has no simulator input range")]
    NoSimInputRange(u32),
}

impl MappingError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}
