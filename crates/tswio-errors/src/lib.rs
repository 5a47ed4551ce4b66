//! Centralized error types for the TSW IO bridge
//!
//! Every component of the bridge reports failures through one of the enums in
//! this crate. The taxonomy mirrors how the runtime reacts to a failure:
//!
//! - [`protocol`]: wire codec failures. Always recoverable, surfaced to the caller.
//! - [`calibration`]: sweep and analyzer failures.
//! - [`mapping`]: lever mapping misconfiguration. The element produces no output
//!   until the notch table is fixed.
//! - [`controller`]: missing bindings, sequences or devices. Skipped silently.
//! - [`simulator`] and [`transport`]: collaborator I/O failures. Logged and
//!   treated as skipped operations, never retried.
//! - [`repository`]: persistence boundary failures.
//! - [`validation`]: construction-time invariant violations.
//! - [`keystroke`]: key combo parsing and keystroke helper failures.
//!
//! # Example
//!
//! ```
//! use tswio_errors::prelude::*;
//!
//! fn check_interval(ms: u64) -> Result<u64> {
//!     if ms == 0 || ms > 5000 {
//!         return Err(ValidationError::out_of_range("repeat_interval_ms", ms, 1, 5000).into());
//!     }
//!     Ok(ms)
//! }
//!
//! assert!(check_interval(0).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod calibration;
pub mod common;
pub mod controller;
pub mod keystroke;
pub mod mapping;
pub mod prelude;
pub mod protocol;
pub mod repository;
pub mod simulator;
pub mod transport;
pub mod validation;

pub use calibration::CalibrationError;
pub use common::{ErrorCategory, ErrorSeverity, TswIoError};
pub use controller::ControllerError;
pub use keystroke::KeystrokeError;
pub use mapping::MappingError;
pub use protocol::ProtocolError;
pub use repository::RepositoryError;
pub use simulator::SimulatorError;
pub use transport::TransportError;
pub use validation::ValidationError;

/// A specialized `Result` type for bridge operations.
pub type Result<T> = std::result::Result<T, TswIoError>;
