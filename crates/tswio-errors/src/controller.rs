//! Button controller error types.

use crate::common::ErrorSeverity;

/// Controller errors.
///
/// Lookups that come back empty are expected during hot-plug and train
/// changes; callers log them at debug level and move on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// No enabled binding for this input
    #[error("binding not found for input {0}")]
    BindingNotFound(String),

    /// Referenced sequence does not exist
    #[error("sequence not found: {0}")]
    SequenceNotFound(String),

    /// Referenced device or input does not exist
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The per-button worker has shut down
    #[error("button worker for input {0} has stopped")]
    WorkerStopped(String),

    /// Binding fields violate a mode invariant
    #[error("invalid binding: {0}")]
    InvalidBinding(String),
}

impl ControllerError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ControllerError::InvalidBinding(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Info,
        }
    }

    /// True for the `not_found` family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ControllerError::BindingNotFound(_)
                | ControllerError::SequenceNotFound(_)
                | ControllerError::DeviceNotFound(_)
        )
    }
}
