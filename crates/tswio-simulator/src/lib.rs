//! Simulator API client
//!
//! Everything the bridge does ends up as a `get`, `set` or `list` against the
//! simulator's external interface. [`SimulatorClient`] is the seam; the rest of
//! the workspace only ever holds an `Arc<dyn SimulatorClient>`.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod client;
pub mod http;
pub mod value;

pub use client::*;
pub use http::*;
pub use value::*;

pub use tswio_errors::SimulatorError;

pub type SimulatorResult<T> = Result<T, SimulatorError>;
