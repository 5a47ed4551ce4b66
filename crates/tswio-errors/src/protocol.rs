//! Wire protocol error types.
//!
//! Encode-side variants describe a message that cannot be put on the wire;
//! decode-side variants describe a buffer that is not a complete message.
//! Neither is ever fatal to the bridge.

use crate::common::ErrorSeverity;

/// Wire codec errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Wrong leading tag, truncated body, or trailing bytes
    #[error("invalid message")]
    InvalidMessage,

    /// A pin list is too long or reuses a pin
    #[error("invalid pin")]
    InvalidPin,

    /// A field value is outside its allowed range
    #[error("invalid value")]
    InvalidValue,

    /// More than 255 detents in a haptic profile
    #[error("too many detents")]
    TooManyDetents,

    /// More than 255 ranges in a haptic profile
    #[error("too many ranges")]
    TooManyRanges,

    /// Detent field outside its allowed range
    #[error("invalid detent")]
    InvalidDetent,

    /// Range refers to detents that do not exist or are reversed
    #[error("invalid range")]
    InvalidRange,

    /// Profile parameters are inconsistent as a whole
    #[error("invalid profile params")]
    InvalidProfileParams,

    /// Leading byte is not a known message tag
    #[error("unknown message type: {0:#04x}")]
    UnknownMessageType(u8),

    /// Buffer is empty
    #[error("insufficient data")]
    InsufficientData,

    /// Body discriminator is not recognized
    #[error("invalid input")]
    InvalidInput,
}

impl ProtocolError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ProtocolError::UnknownMessageType(_) | ProtocolError::InsufficientData => {
                ErrorSeverity::Warning
            }
            _ => ErrorSeverity::Error,
        }
    }

    /// True for errors raised while decoding received bytes.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::InvalidMessage
                | ProtocolError::UnknownMessageType(_)
                | ProtocolError::InsufficientData
                | ProtocolError::InvalidInput
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_display() {
        assert_eq!(
            ProtocolError::UnknownMessageType(0x09).to_string(),
            "unknown message type: 0x09"
        );
    }

    #[test]
    fn test_decode_classification() {
        assert!(ProtocolError::InvalidMessage.is_decode_error());
        assert!(!ProtocolError::TooManyDetents.is_decode_error());
    }
}
