//! Device transport error types.

use crate::common::ErrorSeverity;

/// Device transport errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The transport is closed
    #[error("transport {0} closed")]
    Closed(String),

    /// Lower-level I/O failed
    #[error("I/O error on transport {transport}: {message}")]
    Io {
        /// Transport identifier
        transport: String,
        /// Error message
        message: String,
    },

    /// No reply arrived in time
    #[error("transport {transport} timeout after {timeout_ms}ms")]
    Timeout {
        /// Transport identifier
        transport: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Frame exceeds what the framing can carry
    #[error("frame of {0} bytes is too large")]
    FrameTooLarge(usize),
}

impl TransportError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TransportError::Closed(_) => ErrorSeverity::Error,
            TransportError::Io { .. } => ErrorSeverity::Error,
            TransportError::Timeout { .. } => ErrorSeverity::Warning,
            TransportError::FrameTooLarge(_) => ErrorSeverity::Warning,
        }
    }

    /// Create an I/O error.
    pub fn io(transport: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Io {
            transport: transport.into(),
            message: message.into(),
        }
    }
}
