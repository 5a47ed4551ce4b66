//! Zone detection over sweep samples
//!
//! Pure functions; the live boundary probe lives in [`crate::analyzer`].

use serde::{Deserialize, Serialize};

/// One sweep reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub set_input: f64,
    pub actual_input: f64,
    pub output: f64,
    /// The simulator moved the lever away from where it was put.
    pub snapped: bool,
}

impl Sample {
    pub fn new(set_input: f64, actual_input: f64, output: f64, snap_threshold: f64) -> Self {
        Self {
            set_input,
            actual_input,
            output,
            snapped: (actual_input - set_input).abs() > snap_threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneKind {
    Gate { value: f64 },
    Linear { output_min: f64, output_max: f64 },
}

/// A run of consecutive samples believed to belong to one notch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(flatten)]
    pub kind: ZoneKind,
    pub set_input_min: f64,
    pub set_input_max: f64,
    pub actual_input_min: f64,
    pub actual_input_max: f64,
    pub sample_count: usize,
}

impl Zone {
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, ZoneKind::Gate { .. })
    }
}

/// Thresholds for grouping and classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneThresholds {
    /// Output jump between neighbours that always starts a new group.
    pub discontinuity: f64,
    /// Output change below which a step counts as flat.
    pub flat_step: f64,
    /// Output range below which a group is a gate.
    pub gate: f64,
    /// Gates closer than this are snap-back duplicates.
    pub merge_tolerance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slope {
    Flat,
    Moving,
}

/// Why a group boundary was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCause {
    Jump,
    SlopeChange,
}

/// A contiguous run of samples, with the cause of the boundary in front of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub samples: Vec<Sample>,
    pub leading: Option<BoundaryCause>,
}

impl Group {
    fn new(first: Sample, leading: Option<BoundaryCause>) -> Self {
        Self {
            samples: vec![first],
            leading,
        }
    }

    pub fn output_range(&self) -> (f64, f64) {
        fold_range(self.samples.iter().map(|s| s.output))
    }

    pub fn output_span(&self) -> f64 {
        let (lo, hi) = self.output_range();
        hi - lo
    }

    pub fn mean_output(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.samples.iter().map(|s| s.output).sum();
        sum / self.samples.len() as f64
    }

    pub fn is_flat(&self, gate: f64) -> bool {
        self.output_span() < gate
    }

    pub fn first_set_input(&self) -> f64 {
        self.samples.first().map_or(0.0, |s| s.set_input)
    }

    pub fn last_set_input(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.set_input)
    }

    /// Least-squares line through the group's outputs against set input,
    /// as `(mean_input, mean_output, slope)`. `None` when every sample sits
    /// at the same input.
    pub fn trend(&self) -> Option<(f64, f64, f64)> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f64;
        let mean_x = self.samples.iter().map(|s| s.set_input).sum::<f64>() / n;
        let mean_y = self.mean_output();
        let (sxx, sxy) = self.samples.iter().fold((0.0, 0.0), |(sxx, sxy), s| {
            let dx = s.set_input - mean_x;
            (sxx + dx * dx, sxy + dx * (s.output - mean_y))
        });
        if sxx <= f64::EPSILON {
            return None;
        }
        Some((mean_x, mean_y, sxy / sxx))
    }

    fn absorb(&mut self, other: Group) {
        self.samples.extend(other.samples);
    }

    pub fn to_zone(&self, gate: f64) -> Zone {
        let (out_lo, out_hi) = self.output_range();
        let (set_lo, set_hi) = fold_range(self.samples.iter().map(|s| s.set_input));
        let (act_lo, act_hi) = fold_range(self.samples.iter().map(|s| s.actual_input));
        let kind = if out_hi - out_lo < gate {
            ZoneKind::Gate {
                value: out_lo + (out_hi - out_lo) / 2.0,
            }
        } else {
            ZoneKind::Linear {
                output_min: out_lo,
                output_max: out_hi,
            }
        };
        Zone {
            kind,
            set_input_min: set_lo,
            set_input_max: set_hi,
            actual_input_min: act_lo,
            actual_input_max: act_hi,
            sample_count: self.samples.len(),
        }
    }
}

fn fold_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo > hi { (0.0, 0.0) } else { (lo, hi) }
}

/// Split samples wherever the output jumps by more than the discontinuity
/// threshold. Runs between jumps are further cut where the output switches
/// between holding still and moving, so a gate that flows smoothly into a
/// ramp still gets a candidate boundary. Deliberately over-segments: every
/// boundary is a candidate until the analyzer confirms it live.
pub fn rough_groups(samples: &[Sample], thresholds: &ZoneThresholds) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut current: Option<(Group, Option<Slope>)> = None;
    let mut previous: Option<Sample> = None;

    for sample in samples.iter().copied() {
        let Some(prev) = previous.replace(sample) else {
            current = Some((Group::new(sample, None), None));
            continue;
        };
        let Some((mut group, slope)) = current.take() else {
            current = Some((Group::new(sample, None), None));
            continue;
        };

        let delta = (sample.output - prev.output).abs();
        if delta > thresholds.discontinuity {
            groups.push(group);
            current = Some((Group::new(sample, Some(BoundaryCause::Jump)), None));
            continue;
        }

        let step = if delta < thresholds.flat_step {
            Slope::Flat
        } else {
            Slope::Moving
        };
        match slope {
            Some(existing) if existing != step => {
                groups.push(group);
                current = Some((Group::new(sample, Some(BoundaryCause::SlopeChange)), None));
            }
            _ => {
                group.samples.push(sample);
                current = Some((group, Some(step)));
            }
        }
    }

    if let Some((group, _)) = current {
        groups.push(group);
    }
    groups
}

/// Fold single-sample groups that only exist because of a slope wobble into
/// the group before them, then merge neighbouring gates with nearly the same
/// value (snap-back artifacts).
/// Whether a flat group is a gate of its own rather than a plateau on the
/// moving neighbour's ramp (quantized or briefly stalled output).
///
/// The neighbour's trend line is extended to the flat group's far end; a
/// real gate holds its value away from where the ramp would have taken it.
/// A neighbour without a usable trend keeps the boundary.
pub fn gate_stands_apart(flat: &Group, moving: &Group, gate: f64) -> bool {
    let Some((mean_x, mean_y, slope)) = moving.trend() else {
        return true;
    };
    let far = if flat.first_set_input() < moving.first_set_input() {
        flat.samples.first()
    } else {
        flat.samples.last()
    };
    let Some(far) = far else {
        return true;
    };
    let predicted = mean_y + slope * (far.set_input - mean_x);
    (predicted - flat.mean_output()).abs() > gate
}

pub fn merge_artifacts(groups: Vec<Group>, thresholds: &ZoneThresholds) -> Vec<Group> {
    let mut merged: Vec<Group> = Vec::with_capacity(groups.len());
    let mut pending = groups.into_iter().peekable();

    while let Some(group) = pending.next() {
        let next_cause = pending.peek().and_then(|g| g.leading);
        let sliver = group.samples.len() == 1
            && group.leading == Some(BoundaryCause::SlopeChange)
            && next_cause != Some(BoundaryCause::Jump);

        let Some(last) = merged.last_mut() else {
            merged.push(group);
            continue;
        };

        let duplicate_gate = last.is_flat(thresholds.gate)
            && group.is_flat(thresholds.gate)
            && (last.mean_output() - group.mean_output()).abs() <= thresholds.merge_tolerance;

        if sliver || duplicate_gate {
            last.absorb(group);
        } else {
            merged.push(group);
        }
    }
    merged
}
