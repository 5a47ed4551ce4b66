//! Prelude module for convenient error handling imports.
//!
//! ```
//! use tswio_errors::prelude::*;
//!
//! fn load(path: &str) -> Result<String> {
//!     if path.is_empty() {
//!         return Err(ValidationError::required("path").into());
//!     }
//!     Ok(path.to_string())
//! }
//! # assert!(load("").is_err());
//! ```

pub use crate::{
    CalibrationError, ControllerError, KeystrokeError, MappingError, ProtocolError,
    RepositoryError, Result, SimulatorError, TransportError, ValidationError,
    common::{ErrorCategory, ErrorSeverity, TswIoError},
};
