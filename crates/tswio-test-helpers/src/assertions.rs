//! Assertion macros.

/// Assert that two floating-point values are within `tolerance` of each other.
///
/// ```rust
/// use tswio_test_helpers::assert_approx_eq;
///
/// assert_approx_eq!(0.1 + 0.2, 0.3, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $tolerance, "values differ")
    };
    ($left:expr, $right:expr, $tolerance:expr, $($arg:tt)+) => {{
        let left: f64 = $left;
        let right: f64 = $right;
        let tolerance: f64 = $tolerance;
        let diff = (left - right).abs();
        if diff.is_nan() || diff > tolerance {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n  tolerance: `{:?}`: {}",
                left, right, diff, tolerance, format_args!($($arg)+)
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_eq_within_tolerance() {
        assert_approx_eq!(0.25, 0.2500001, 1e-3);
    }

    #[test]
    #[should_panic(expected = "assertion failed: `(left ≈ right)`")]
    fn test_approx_eq_outside_tolerance() {
        assert_approx_eq!(0.25, 0.3, 1e-3);
    }

    #[test]
    #[should_panic(expected = "assertion failed: `(left ≈ right)`")]
    fn test_approx_eq_nan_fails() {
        assert_approx_eq!(f64::NAN, 0.0, 1.0);
    }
}
