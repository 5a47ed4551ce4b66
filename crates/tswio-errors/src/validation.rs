//! Input validation error types.
//!
//! Raised once, when a record is turned into a typed domain value. After
//! construction the invariants hold and are not re-checked.

use core::fmt;

use crate::common::ErrorSeverity;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Value out of range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: String,
        /// The invalid value
        value: String,
        /// Minimum allowed value
        min: String,
        /// Maximum allowed value
        max: String,
    },

    /// Value is required but missing
    #[error("Required field '{0}' is missing")]
    Required(String),

    /// Field is set where it is not allowed
    #[error("Field '{field}' is not allowed: {reason}")]
    NotAllowed {
        /// Field name
        field: String,
        /// Why it is not allowed
        reason: String,
    },

    /// Invalid format
    #[error("Invalid format for field '{field}': {reason}")]
    InvalidFormat {
        /// Field name
        field: String,
        /// Reason for the format error
        reason: String,
    },

    /// Value not unique
    #[error("Value for field '{field}' must be unique but '{value}' already exists")]
    NotUnique {
        /// Field name
        field: String,
        /// The duplicate value
        value: String,
    },

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl ValidationError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    /// Create an out of range error for a numeric value.
    pub fn out_of_range<T: fmt::Debug>(field: impl Into<String>, value: T, min: T, max: T) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            value: format!("{value:?}"),
            min: format!("{min:?}"),
            max: format!("{max:?}"),
        }
    }

    /// Create a required field error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required(field.into())
    }

    /// Create a not-allowed field error.
    pub fn not_allowed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::NotAllowed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid format error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-unique error.
    pub fn not_unique(field: impl Into<String>, value: impl ToString) -> Self {
        ValidationError::NotUnique {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Create a constraint violation error.
    pub fn constraint(msg: impl Into<String>) -> Self {
        ValidationError::ConstraintViolation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_display() {
        let err = ValidationError::out_of_range("repeat_interval_ms", 0u64, 1, 5000);
        assert_eq!(
            err.to_string(),
            "repeat_interval_ms value 0 is out of range [1, 5000]"
        );
    }

    #[test]
    fn test_required_display() {
        let err = ValidationError::required("endpoint");
        assert_eq!(err.to_string(), "Required field 'endpoint' is missing");
    }
}
