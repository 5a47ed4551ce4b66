//! Binding validation properties.

use insta::assert_snapshot;
use proptest::prelude::*;
use tswio_buttons::{
    Binding, BindingDefaults, ButtonInputBinding, ButtonMode, MAX_REPEAT_INTERVAL_MS,
};

fn momentary() -> ButtonInputBinding {
    ButtonInputBinding::new("horn", "desk/horn", ButtonMode::Momentary)
        .with_endpoint("Horn.InputValue")
}

proptest! {
    #[test]
    fn prop_repeat_interval_accepted_inside_bounds(ms in 1u64..=MAX_REPEAT_INTERVAL_MS) {
        let binding = Binding::try_from(&momentary().with_repeat_interval_ms(ms));
        prop_assert_eq!(binding.map(|b| b.mode()), Ok(ButtonMode::Momentary));
    }

    #[test]
    fn prop_repeat_interval_rejected_above_bound(ms in (MAX_REPEAT_INTERVAL_MS + 1)..u64::MAX) {
        prop_assert!(Binding::try_from(&momentary().with_repeat_interval_ms(ms)).is_err());
    }

    #[test]
    fn prop_configured_default_fills_missing_interval(ms in 1u64..=MAX_REPEAT_INTERVAL_MS) {
        let defaults = BindingDefaults { repeat_interval_ms: ms };
        prop_assert!(Binding::from_record(&momentary(), &defaults).is_ok());
    }
}

#[test]
fn validation_messages_name_the_field() {
    let zero = Binding::try_from(&momentary().with_repeat_interval_ms(0));
    assert_snapshot!(
        zero.err().map(|e| e.to_string()).unwrap_or_default(),
        @"repeat_interval_ms value 0 is out of range [1, 5000]"
    );

    let missing = Binding::try_from(&ButtonInputBinding::new("horn", "desk/horn", ButtonMode::Simple));
    assert_snapshot!(
        missing.err().map(|e| e.to_string()).unwrap_or_default(),
        @"Required field 'endpoint' is missing"
    );
}
