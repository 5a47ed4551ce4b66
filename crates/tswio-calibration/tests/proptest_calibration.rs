//! Property-based tests for calibration: range bounds, direction detection,
//! and rollover unwrapping.

use proptest::prelude::*;
use tswio_calibration::{Calibration, CalibrationSession, analyze_sweep};
use tswio_test_helpers::must;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// normalize never leaves 0..=span for any raw reading.
    #[test]
    fn normalize_stays_in_span(
        min in 0u16..=1023,
        max in 0u16..=1023,
        inverted in any::<bool>(),
        rollover in any::<bool>(),
        raw in -2048i32..4096,
    ) {
        if let Ok(calib) = Calibration::new(min, max, 1023, inverted, rollover) {
            let value = calib.normalize(raw);
            prop_assert!(value <= calib.span(), "{} > span {}", value, calib.span());
            let fraction = calib.normalized(raw);
            prop_assert!((0.0..=1.0).contains(&fraction));
        }
    }

    /// The ends of travel map to 0 and span exactly.
    #[test]
    fn endpoints_are_exact(min in 0u16..500, spread in 1u16..500) {
        let max = min + spread;
        let calib = must(Calibration::new(min, max, 1023, false, false));
        prop_assert_eq!(calib.normalize(i32::from(min)), 0);
        prop_assert_eq!(calib.normalize(i32::from(max)), spread);

        let flipped = must(Calibration::new(max, min, 1023, true, false));
        prop_assert_eq!(flipped.normalize(i32::from(max)), 0);
        prop_assert_eq!(flipped.normalize(i32::from(min)), spread);
    }

    /// A strictly monotonic sweep is classified by its direction and never as rollover.
    #[test]
    fn monotonic_sweep_direction(
        start in 0i32..200,
        steps in proptest::collection::vec(1i32..20, 2..40),
        descending in any::<bool>(),
    ) {
        let mut samples = vec![start];
        let mut value = start;
        for step in &steps {
            value += step;
            samples.push(value);
        }
        if descending {
            samples.reverse();
        }
        let analysis = analyze_sweep(&samples, 1023);
        prop_assert_eq!(analysis.inverted, descending);
        prop_assert!(!analysis.rollover);
    }

    /// A sweep that crosses the wrap point calibrates to the unwrapped travel.
    #[test]
    fn session_unwraps_wrapped_sweep(
        start in 900u16..1020,
        step in 3u16..9,
        count in 10usize..40,
    ) {
        let modulus = 1024u32;
        let mut session = CalibrationSession::new(1023);
        for i in 0..count {
            let unwrapped = u32::from(start) + u32::from(step) * i as u32;
            session.add_sample((unwrapped % modulus) as i32);
        }
        let travel = u32::from(step) * (count as u32 - 1);
        let calib = must(session.finish());
        prop_assert_eq!(u32::from(calib.span()), travel);
        prop_assert_eq!(calib.normalize(i32::from(calib.max)), calib.span());
    }
}
