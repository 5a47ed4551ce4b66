//! Runtime lever mapping

use tswio_errors::MappingError;

use crate::{LeverConfig, NotchKind};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Map a normalized hardware position to the simulator input for this lever.
///
/// Gate notches always produce the middle of their simulator range, exactly;
/// linear notches interpolate across it and round to two decimals.
///
/// ```
/// use tswio_lever::{map_input, LeverConfig, LeverEndpoints, LeverType, Notch};
///
/// let config = LeverConfig::new(
///     LeverEndpoints::for_control("Throttle(Lever)"),
///     LeverType::Continuous,
///     vec![Notch::linear(0, 0.0, 1.0).with_input(0.1, 0.4).with_sim_input(0.05, 0.45)],
/// )?;
/// assert_eq!(map_input(&config, 0.25), Ok(0.25));
/// # Ok::<(), tswio_lever::ValidationError>(())
/// ```
pub fn map_input(config: &LeverConfig, hw_value: f64) -> Result<f64, MappingError> {
    let clamped = hw_value.clamp(0.0, 1.0);
    let value = if config.inverted {
        round2(1.0 - clamped)
    } else {
        clamped
    };

    let Some(notch) = config.notches().iter().find(|n| n.contains(value)) else {
        return Err(match config.notches().iter().find(|n| n.input.is_none()) {
            Some(unmapped) => MappingError::UnmappedNotch(unmapped.index),
            None => MappingError::NoNotch(value),
        });
    };

    let input = notch.input.ok_or(MappingError::UnmappedNotch(notch.index))?;
    let sim = notch
        .sim_input
        .ok_or(MappingError::NoSimInputRange(notch.index))?;

    Ok(match notch.kind {
        NotchKind::Gate { .. } => sim.midpoint(),
        NotchKind::Linear { .. } => {
            let position = ((value - input.min) / input.width()).clamp(0.0, 1.0);
            round2(sim.min + position * sim.width())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LeverEndpoints, LeverType, Notch};
    use tswio_test_helpers::must;

    fn config(notches: Vec<Notch>) -> LeverConfig {
        must(LeverConfig::new(
            LeverEndpoints::for_control("Throttle(Lever)"),
            LeverType::Hybrid,
            notches,
        ))
    }

    fn approx(a: Result<f64, MappingError>, b: f64) -> bool {
        a.is_ok_and(|v| (v - b).abs() < 1e-9)
    }

    #[test]
    fn test_linear_midpoint() {
        let cfg = config(vec![
            Notch::linear(0, 0.0, 1.0)
                .with_input(0.1, 0.4)
                .with_sim_input(0.05, 0.45),
        ]);
        assert!(approx(map_input(&cfg, 0.25), 0.25));
        assert!(approx(map_input(&cfg, 0.1), 0.05));
    }

    #[test]
    fn test_gate_is_constant() {
        let cfg = config(vec![Notch::gate(0, 0.0).with_input(0.0, 0.3).with_sim_input(0.0, 0.2)]);
        for hw in [0.0, 0.1, 0.2, 0.29] {
            assert!(approx(map_input(&cfg, hw), 0.1), "hw {hw}");
        }
    }

    #[test]
    fn test_gate_midpoint_is_not_rounded() {
        let cfg = config(vec![Notch::gate(0, 0.0).with_input(0.0, 0.01).with_sim_input(0.02, 0.29)]);
        assert_eq!(map_input(&cfg, 0.0), Ok((0.02 + 0.29) / 2.0));
        assert_eq!(map_input(&cfg, 0.005), map_input(&cfg, 0.0));
    }

    #[test]
    fn test_inverted_lookup() {
        let cfg = config(vec![
            Notch::gate(0, -1.0).with_input(0.0, 0.5).with_sim_input(0.0, 0.0),
            Notch::gate(1, 1.0).with_input(0.5, 1.0).with_sim_input(1.0, 1.0),
        ])
        .with_inverted(true);
        assert!(approx(map_input(&cfg, 0.0), 1.0));
        assert!(approx(map_input(&cfg, 0.9), 0.0));
    }

    #[test]
    fn test_top_of_travel_is_closed() {
        let cfg = config(vec![Notch::gate(0, 1.0).with_input(0.8, 1.0).with_sim_input(0.9, 1.0)]);
        assert!(approx(map_input(&cfg, 1.0), 0.95));
    }

    #[test]
    fn test_errors() {
        let gap = config(vec![Notch::gate(0, 0.0).with_input(0.0, 0.3).with_sim_input(0.0, 0.1)]);
        assert_eq!(map_input(&gap, 0.5), Err(MappingError::NoNotch(0.5)));

        let unmapped = config(vec![
            Notch::gate(0, 0.0).with_input(0.0, 0.3).with_sim_input(0.0, 0.1),
            Notch::gate(1, 1.0),
        ]);
        assert_eq!(map_input(&unmapped, 0.5), Err(MappingError::UnmappedNotch(1)));

        let no_sim = config(vec![Notch::gate(3, 0.0).with_input(0.0, 1.0)]);
        assert_eq!(map_input(&no_sim, 0.5), Err(MappingError::NoSimInputRange(3)));
    }
}
