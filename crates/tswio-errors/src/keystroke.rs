//! Keystroke injection error types.

use crate::common::ErrorSeverity;

/// Errors from parsing key combos or driving the keystroke helper.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeystrokeError {
    /// The combo string could not be parsed
    #[error("invalid key combo {combo:?}: {reason}")]
    InvalidCombo {
        /// The combo as given
        combo: String,
        /// Why it was rejected
        reason: String,
    },

    /// The helper program could not be started
    #[error("failed to run keystroke helper {program}: {message}")]
    Spawn {
        /// Helper program
        program: String,
        /// Error message
        message: String,
    },

    /// The helper ran but reported failure
    #[error("keystroke helper {program} exited with status {status}")]
    Failed {
        /// Helper program
        program: String,
        /// Exit status, -1 if killed by a signal
        status: i32,
    },

    /// No helper is configured
    #[error("keystroke output is disabled")]
    Disabled,
}

impl KeystrokeError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            KeystrokeError::InvalidCombo { .. } => ErrorSeverity::Error,
            KeystrokeError::Disabled => ErrorSeverity::Info,
            _ => ErrorSeverity::Warning,
        }
    }

    /// Create an invalid combo error.
    pub fn invalid_combo(combo: impl Into<String>, reason: impl Into<String>) -> Self {
        KeystrokeError::InvalidCombo {
            combo: combo.into(),
            reason: reason.into(),
        }
    }
}
