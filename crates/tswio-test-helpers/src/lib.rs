//! Shared test utilities for the TSW IO bridge.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`assertions`] - Assertion macros for floating point and ordering checks
//! - [`simulator`] - Scriptable in-memory simulator
//! - [`transport`] - In-memory device transport
//! - [`keystroke`] - Keystroke sink that records instead of typing
//! - [`fixtures`] - Lever response curves used across the suites
//! - [`prelude`] - Convenience re-exports
//!
//! ```rust,ignore
//! use tswio_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod assertions;
pub mod fixtures;
pub mod keystroke;
pub mod must;
pub mod prelude;
pub mod simulator;
pub mod transport;

pub use must::*;
