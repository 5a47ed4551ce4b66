//! Property-based tests for error classification.

use proptest::prelude::*;
use tswio_errors::{ErrorSeverity, ProtocolError, TswIoError, ValidationError};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_unknown_type_is_recoverable(tag in any::<u8>()) {
        let err: TswIoError = ProtocolError::UnknownMessageType(tag).into();
        prop_assert!(err.is_recoverable());
        prop_assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn prop_out_of_range_mentions_field(value in any::<u64>(), field in "[a-z_]{1,20}") {
        let err = ValidationError::out_of_range(field.clone(), value, 1, 5000);
        let text = err.to_string();
        prop_assert!(text.contains(&field));
        prop_assert!(text.contains(&value.to_string()));
    }
}
