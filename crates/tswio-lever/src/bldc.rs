//! Haptic profiles for BLDC motor levers
//!
//! A motorised lever can render the notch table physically: each gate becomes
//! a detent and each linear notch a damped stretch between the detents around
//! it.

use serde::{Deserialize, Serialize};
use tswio_protocol::{DampingRange, Detent, LoadBldcProfile, MAX_DETENT_POSITION, ProtocolResult};

use crate::{LeverConfig, NotchKind};

/// Force parameters applied to every detent and damped range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BldcParams {
    pub engagement: u8,
    pub hold: u8,
    pub exit: u8,
    pub spring_back: u8,
    pub damping: u8,
}

impl Default for BldcParams {
    fn default() -> Self {
        Self {
            engagement: 60,
            hold: 120,
            exit: 60,
            spring_back: 0,
            damping: 40,
        }
    }
}

fn percent(value: f64) -> u8 {
    let scaled = (value.clamp(0.0, 1.0) * f64::from(MAX_DETENT_POSITION)).round();
    scaled as u8
}

/// Build the BLDC profile for a lever on `pin`.
///
/// Notches without a hardware range are left out. Positions are in physical
/// travel, so an inverted lever's table is mirrored.
pub fn profile_for_lever(
    pin: u8,
    config: &LeverConfig,
    params: &BldcParams,
) -> ProtocolResult<LoadBldcProfile> {
    let physical = |x: f64| if config.inverted { 1.0 - x } else { x };

    let mut detents: Vec<Detent> = config
        .notches()
        .iter()
        .filter(|n| n.kind.is_gate())
        .filter_map(|n| n.input)
        .map(|range| Detent {
            position: percent(physical(range.midpoint())),
            engagement: params.engagement,
            hold: params.hold,
            exit: params.exit,
            spring_back: params.spring_back,
        })
        .collect();
    detents.sort_by_key(|d| d.position);
    detents.dedup_by_key(|d| d.position);

    let mut ranges = Vec::new();
    for notch in config.notches() {
        let (NotchKind::Linear { .. }, Some(range)) = (notch.kind, notch.input) else {
            continue;
        };
        let (a, b) = (percent(physical(range.min)), percent(physical(range.max)));
        let (lo, hi) = (a.min(b), a.max(b));
        let start = detents.iter().rposition(|d| d.position <= lo);
        let end = detents.iter().position(|d| d.position >= hi);
        if let (Some(start), Some(end)) = (start, end) {
            let (Ok(start_detent), Ok(end_detent)) = (u8::try_from(start), u8::try_from(end))
            else {
                continue;
            };
            ranges.push(DampingRange {
                start_detent,
                end_detent,
                damping: params.damping,
            });
        }
    }

    let profile = LoadBldcProfile {
        pin,
        detents,
        ranges,
    };
    profile.validate()?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LeverEndpoints, LeverType, Notch};
    use tswio_test_helpers::must;

    fn hybrid() -> LeverConfig {
        must(LeverConfig::new(
            LeverEndpoints::for_control("Throttle(Lever)"),
            LeverType::Hybrid,
            vec![
                Notch::gate(0, -1.0).with_input(0.0, 0.2).with_sim_input(0.0, 0.2),
                Notch::linear(1, -1.0, 1.0).with_input(0.2, 0.8).with_sim_input(0.22, 0.8),
                Notch::gate(2, 1.0).with_input(0.8, 1.0).with_sim_input(0.82, 1.0),
            ],
        ))
    }

    #[test]
    fn test_detents_and_range() -> ProtocolResult<()> {
        let profile = profile_for_lever(4, &hybrid(), &BldcParams::default())?;
        let positions: Vec<u8> = profile.detents.iter().map(|d| d.position).collect();
        assert_eq!(positions, vec![10, 90]);
        assert_eq!(
            profile.ranges,
            vec![DampingRange {
                start_detent: 0,
                end_detent: 1,
                damping: 40
            }]
        );
        Ok(())
    }

    #[test]
    fn test_inverted_mirrors_positions() -> ProtocolResult<()> {
        let config = hybrid().with_inverted(true);
        let profile = profile_for_lever(4, &config, &BldcParams::default())?;
        let positions: Vec<u8> = profile.detents.iter().map(|d| d.position).collect();
        assert_eq!(positions, vec![10, 90]);
        assert_eq!(profile.ranges.len(), 1);
        Ok(())
    }

    #[test]
    fn test_linear_only_has_no_ranges() -> ProtocolResult<()> {
        let config = must(LeverConfig::new(
            LeverEndpoints::for_control("Throttle(Lever)"),
            LeverType::Continuous,
            vec![Notch::linear(0, 0.0, 1.0).with_input(0.0, 1.0).with_sim_input(0.0, 1.0)],
        ));
        let profile = profile_for_lever(1, &config, &BldcParams::default())?;
        assert!(profile.detents.is_empty());
        assert!(profile.ranges.is_empty());
        Ok(())
    }
}
