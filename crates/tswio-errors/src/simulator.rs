//! Simulator client error types.

use crate::common::ErrorSeverity;

/// Errors from the simulator's external interface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulatorError {
    /// The request could not be delivered
    #[error("request to {path} failed: {message}")]
    Request {
        /// Endpoint path
        path: String,
        /// Error message
        message: String,
    },

    /// The simulator answered with a non-success HTTP status
    #[error("simulator returned HTTP {status} for {path}")]
    Status {
        /// Endpoint path
        path: String,
        /// HTTP status code
        status: u16,
    },

    /// The simulator answered but reported a failure
    #[error("simulator rejected {path}: {message}")]
    Rejected {
        /// Endpoint path
        path: String,
        /// Message from the simulator
        message: String,
    },

    /// The response body could not be interpreted
    #[error("invalid response for {path}: {reason}")]
    InvalidResponse {
        /// Endpoint path
        path: String,
        /// Why the body was rejected
        reason: String,
    },

    /// The client is not configured (no comm key, bad base URL)
    #[error("simulator client not configured: {0}")]
    NotConfigured(String),
}

impl SimulatorError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SimulatorError::NotConfigured(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Warning,
        }
    }

    /// Create a request failure error.
    pub fn request(path: impl Into<String>, message: impl Into<String>) -> Self {
        SimulatorError::Request {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SimulatorError::InvalidResponse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
