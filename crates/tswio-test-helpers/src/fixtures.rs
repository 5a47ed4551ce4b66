//! Lever response curves for [`MockSimulator`](crate::simulator::MockSimulator).
//!
//! Each returns `(actual_input, output)` for a requested input.

/// Gate at -1 below 0.2, linear -1 to 1 across 0.2..=0.8, gate at 1 above.
/// The lever goes exactly where it is put.
pub fn three_zone_response(set: f64) -> (f64, f64) {
    let set = set.clamp(0.0, 1.0);
    let output = if set < 0.2 {
        -1.0
    } else if set <= 0.8 {
        -1.0 + (set - 0.2) / 0.6 * 2.0
    } else {
        1.0
    };
    (set, output)
}

/// A notched lever with `notches` evenly spaced detents. The lever snaps to
/// the nearest detent and outputs the detent's index.
pub fn discrete_response(notches: u32) -> impl Fn(f64) -> (f64, f64) + Send + Sync + Clone {
    let last = f64::from(notches.max(2) - 1);
    move |set: f64| {
        let index = (set.clamp(0.0, 1.0) * last).round();
        (index / last, index)
    }
}

/// Detents at the given outputs without any snapping: the lever stays where
/// it is put and reports the output of the band it sits in.
pub fn stepped_gate_response(outputs: Vec<f64>) -> impl Fn(f64) -> (f64, f64) + Send + Sync + Clone {
    move |set: f64| {
        let set = set.clamp(0.0, 1.0);
        let bands = outputs.len().max(1);
        let band = ((set * bands as f64) as usize).min(bands - 1);
        (set, outputs.get(band).copied().unwrap_or(0.0))
    }
}
