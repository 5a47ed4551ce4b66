//! Persistence boundary error types.

use crate::common::ErrorSeverity;

/// Repository errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// Record does not exist
    #[error("{kind} {id} not found")]
    NotFound {
        /// Record kind (train, sequence, input...)
        kind: &'static str,
        /// Record identifier
        id: String,
    },

    /// Storage backend failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Record could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record failed validation and was not stored
    #[error("invalid {kind}: {message}")]
    Invalid {
        /// Record kind
        kind: &'static str,
        /// Validation failure
        message: String,
    },
}

impl RepositoryError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RepositoryError::NotFound { .. } => ErrorSeverity::Info,
            RepositoryError::Invalid { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Create a not-found error.
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        RepositoryError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create an invalid-record error.
    pub fn invalid(kind: &'static str, message: impl ToString) -> Self {
        RepositoryError::Invalid {
            kind,
            message: message.to_string(),
        }
    }
}
