//! Convenience re-exports for common test utilities.

pub use crate::must::{must, must_some};

pub use crate::fixtures::{discrete_response, stepped_gate_response, three_zone_response};
pub use crate::keystroke::{KeyEvent, RecordingKeystrokeSink};
pub use crate::simulator::{LeverResponse, MockSimulator, RecordedWrite};
pub use crate::transport::MockTransport;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
