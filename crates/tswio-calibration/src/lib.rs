//! Sensor calibration for lever inputs
//!
//! A lever's analog sensor reports raw ADC counts. Calibration records where
//! the travel starts and ends, whether the reading falls as the lever moves
//! forward (`inverted`), and whether the travel crosses the sensor's wrap
//! point (`rollover`, common with magnetic angle sensors).

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod session;
pub mod sweep;
pub mod types;

pub use session::*;
pub use sweep::*;
pub use types::*;

pub use tswio_errors::CalibrationError;

pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Default full-scale reading of a 10-bit ADC.
pub const DEFAULT_MAX_HARDWARE_VALUE: u16 = 1023;
