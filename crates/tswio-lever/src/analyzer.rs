//! Live lever analyzer
//!
//! Discovers how a lever really behaves by driving it through the simulator:
//!
//! 1. Park the lever at 0.0 with a few rapid writes, then let it settle.
//! 2. Sweep 0.0..=1.0 in fixed steps, reading back the actual input and output.
//! 3. Group samples on output jumps, cutting again where a flat run meets a
//!    moving one (over-segmenting).
//! 4. Merge snap-back artifacts.
//! 5. Probe every remaining boundary from both sides and merge the ones that
//!    turn out not to be real. Between a flat run and a ramp the probe can
//!    only catch a snap; a smooth meeting is kept only when the flat run
//!    holds away from the ramp's trend.
//! 6. Classify zones and the lever, and emit notch suggestions.
//!
//! The lever's self-reported notch metadata is recorded but never trusted.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use tswio_errors::{CalibrationError, ValidationError};
use tswio_simulator::SimulatorClient;

use crate::zones::{Group, ZoneThresholds, gate_stands_apart, merge_artifacts, rough_groups};
use crate::{LeverEndpoints, LeverType, Notch, NotchKind, Sample, Zone, ZoneKind, round2};

pub type AnalyzerResult<T> = Result<T, CalibrationError>;

/// Analyzer tuning. The thresholds are empirical; the defaults are the values
/// that have worked across the simulator's stock levers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub settle_ms: u64,
    pub step: f64,
    pub snap_threshold: f64,
    pub min_samples: usize,
    pub init_writes: u32,
    pub init_interval_ms: u64,
    pub discontinuity_threshold: f64,
    pub flat_step_threshold: f64,
    pub gate_threshold: f64,
    pub merge_tolerance: f64,
    pub probe_steps: u32,
    pub probe_step: f64,
    pub probe_epsilon: f64,
    pub output_margin: f64,
    pub discrete_max_outputs: usize,
    pub continuous_min_outputs: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            settle_ms: 150,
            step: 0.02,
            snap_threshold: 0.03,
            min_samples: 10,
            init_writes: 3,
            init_interval_ms: 30,
            discontinuity_threshold: 0.2,
            flat_step_threshold: 0.001,
            gate_threshold: 0.1,
            merge_tolerance: 0.2,
            probe_steps: 3,
            probe_step: 0.02,
            probe_epsilon: 0.01,
            output_margin: 0.25,
            discrete_max_outputs: 15,
            continuous_min_outputs: 20,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.step > 0.0 && self.step <= 0.5) {
            return Err(ValidationError::out_of_range("analyzer.step", self.step, 0.0, 0.5));
        }
        if self.min_samples < 2 {
            return Err(ValidationError::out_of_range(
                "analyzer.min_samples",
                self.min_samples,
                2,
                usize::MAX,
            ));
        }
        let positive = [
            ("analyzer.snap_threshold", self.snap_threshold),
            ("analyzer.discontinuity_threshold", self.discontinuity_threshold),
            ("analyzer.flat_step_threshold", self.flat_step_threshold),
            ("analyzer.gate_threshold", self.gate_threshold),
            ("analyzer.merge_tolerance", self.merge_tolerance),
            ("analyzer.probe_step", self.probe_step),
            ("analyzer.probe_epsilon", self.probe_epsilon),
            ("analyzer.output_margin", self.output_margin),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ValidationError::out_of_range(field, value, f64::EPSILON, f64::MAX));
            }
        }
        Ok(())
    }

    pub fn thresholds(&self) -> ZoneThresholds {
        ZoneThresholds {
            discontinuity: self.discontinuity_threshold,
            flat_step: self.flat_step_threshold,
            gate: self.gate_threshold,
            merge_tolerance: self.merge_tolerance,
        }
    }

    fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    fn nudge(&self) -> Duration {
        Duration::from_millis(self.init_interval_ms)
    }

    /// Set-points of the sweep, always ending exactly at 1.0.
    pub fn sweep_points(&self) -> Vec<f64> {
        let steps = (1.0 / self.step - 1e-9).ceil() as u32;
        let mut points: Vec<f64> = (0..=steps)
            .map(|i| round4(f64::from(i) * self.step).min(1.0))
            .collect();
        points.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);
        points
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// A notch the analyzer proposes, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotchSuggestion {
    pub index: u32,
    #[serde(flatten)]
    pub kind: NotchKind,
    pub input_min: f64,
    pub input_max: f64,
    pub sim_input_min: f64,
    pub sim_input_max: f64,
    pub description: String,
}

impl NotchSuggestion {
    pub fn to_notch(&self) -> Notch {
        Notch {
            index: self.index,
            kind: self.kind,
            input: None,
            sim_input: None,
            description: Some(self.description.clone()),
        }
        .with_input(self.input_min, self.input_max)
        .with_sim_input(self.sim_input_min, self.sim_input_max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub control: String,
    pub lever_type: LeverType,
    /// What the lever claims about itself, for comparison only.
    pub reported_notch_count: Option<u32>,
    pub zones: Vec<Zone>,
    pub suggestions: Vec<NotchSuggestion>,
    pub samples: Vec<Sample>,
    pub skipped_samples: usize,
}

impl AnalysisReport {
    pub fn notches(&self) -> Vec<Notch> {
        self.suggestions.iter().map(NotchSuggestion::to_notch).collect()
    }
}

/// One analyzer session against a live simulator.
pub struct LeverAnalyzer {
    client: Arc<dyn SimulatorClient>,
    config: AnalyzerConfig,
}

impl LeverAnalyzer {
    pub fn new(client: Arc<dyn SimulatorClient>, config: AnalyzerConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &dyn SimulatorClient {
        self.client.as_ref()
    }

    pub async fn analyze(&self, endpoints: &LeverEndpoints) -> AnalyzerResult<AnalysisReport> {
        info!(control = %endpoints.value, "starting lever analysis");
        let original = self.client.get_f64(&endpoints.value).await.ok();
        let reported_notch_count = self
            .client
            .get_f64(&endpoints.notch_count)
            .await
            .ok()
            .and_then(|n| u32::try_from(n.round() as i64).ok());

        self.initialize(endpoints).await;
        let (samples, skipped_samples) = self.sweep(endpoints).await;
        if samples.len() < self.config.min_samples {
            self.restore(endpoints, original).await;
            return Err(CalibrationError::InsufficientSamples {
                got: samples.len(),
                required: self.config.min_samples,
            });
        }

        let thresholds = self.config.thresholds();
        let groups = merge_artifacts(rough_groups(&samples, &thresholds), &thresholds);
        debug!(groups = groups.len(), "rough zones after merge");
        let groups = self.verify_boundaries(endpoints, groups).await;
        self.restore(endpoints, original).await;

        let zones: Vec<Zone> = groups
            .iter()
            .map(|g| g.to_zone(self.config.gate_threshold))
            .collect();
        let lever_type = classify_lever(&samples, &zones, &self.config);
        let suggestions = suggest_notches(&zones);
        info!(
            control = %endpoints.value,
            %lever_type,
            zones = zones.len(),
            skipped = skipped_samples,
            "lever analysis complete"
        );

        Ok(AnalysisReport {
            control: endpoints.value.clone(),
            lever_type,
            reported_notch_count,
            zones,
            suggestions,
            samples,
            skipped_samples,
        })
    }

    /// Several quick writes of 0.0 to overcome any detent resistance near rest.
    async fn initialize(&self, endpoints: &LeverEndpoints) {
        for _ in 0..self.config.init_writes {
            if let Err(e) = self.client.set(&endpoints.value, 0.0).await {
                warn!(error = %e, "initial lever write failed");
            }
            sleep(self.config.nudge()).await;
        }
        sleep(self.config.settle()).await;
    }

    async fn sweep(&self, endpoints: &LeverEndpoints) -> (Vec<Sample>, usize) {
        let points = self.config.sweep_points();
        let mut samples = Vec::with_capacity(points.len());
        let mut skipped = 0usize;
        for set_input in points {
            match self.sample_at(endpoints, set_input).await {
                Ok(sample) => {
                    debug!(
                        set_input,
                        actual = sample.actual_input,
                        output = sample.output,
                        snapped = sample.snapped,
                        "sweep sample"
                    );
                    samples.push(sample);
                }
                Err(e) => {
                    warn!(set_input, error = %e, "sweep sample failed, skipping");
                    skipped += 1;
                }
            }
        }
        (samples, skipped)
    }

    pub(crate) async fn sample_at(
        &self,
        endpoints: &LeverEndpoints,
        set_input: f64,
    ) -> Result<Sample, tswio_errors::SimulatorError> {
        self.client.set(&endpoints.value, set_input).await?;
        sleep(self.config.settle()).await;
        let actual = self.client.get_f64(&endpoints.value).await?;
        let output = self.client.get_f64(&endpoints.output).await?;
        Ok(Sample::new(set_input, actual, output, self.config.snap_threshold))
    }

    async fn verify_boundaries(&self, endpoints: &LeverEndpoints, groups: Vec<Group>) -> Vec<Group> {
        let gate = self.config.gate_threshold;
        let mut verified: Vec<Group> = Vec::with_capacity(groups.len());
        for group in groups {
            let Some(last) = verified.last_mut() else {
                verified.push(group);
                continue;
            };
            let boundary = (last.last_set_input() + group.first_set_input()) / 2.0;
            let probed = self.probe(endpoints, boundary).await.map(|real| {
                match (last.is_flat(gate), group.is_flat(gate)) {
                    _ if real => true,
                    (true, false) => gate_stands_apart(last, &group, gate),
                    (false, true) => gate_stands_apart(&group, last, gate),
                    _ => false,
                }
            });
            match probed {
                Ok(true) => {
                    debug!(boundary, "boundary confirmed");
                    verified.push(group);
                }
                Ok(false) => {
                    debug!(boundary, "boundary not real, merging zones");
                    last.samples.extend(group.samples);
                }
                Err(e) => {
                    warn!(boundary, error = %e, "boundary probe failed, keeping boundary");
                    verified.push(group);
                }
            }
        }
        verified
    }

    /// Approach `boundary` from below and land just past it, then from above
    /// and land just short of it. A real boundary either snaps the lever to
    /// different places or produces clearly different outputs.
    async fn probe(
        &self,
        endpoints: &LeverEndpoints,
        boundary: f64,
    ) -> Result<bool, tswio_errors::SimulatorError> {
        let (below_actual, below_output) = self.approach(endpoints, boundary, -1.0).await?;
        let (above_actual, above_output) = self.approach(endpoints, boundary, 1.0).await?;
        Ok((below_actual - above_actual).abs() > self.config.snap_threshold
            || (below_output - above_output).abs() > self.config.output_margin)
    }

    /// `side` is -1.0 to come from below, 1.0 to come from above.
    async fn approach(
        &self,
        endpoints: &LeverEndpoints,
        boundary: f64,
        side: f64,
    ) -> Result<(f64, f64), tswio_errors::SimulatorError> {
        for k in (1..=self.config.probe_steps).rev() {
            let position = boundary + side * f64::from(k) * self.config.probe_step;
            self.client.set(&endpoints.value, position.clamp(0.0, 1.0)).await?;
            sleep(self.config.nudge()).await;
        }
        let landing = (boundary - side * self.config.probe_epsilon).clamp(0.0, 1.0);
        self.client.set(&endpoints.value, landing).await?;
        sleep(self.config.settle()).await;
        let actual = self.client.get_f64(&endpoints.value).await?;
        let output = self.client.get_f64(&endpoints.output).await?;
        Ok((actual, output))
    }

    async fn restore(&self, endpoints: &LeverEndpoints, original: Option<f64>) {
        let Some(value) = original else { return };
        if let Err(e) = self.client.set(&endpoints.value, value).await {
            warn!(error = %e, "failed to restore lever position");
        }
    }
}

/// Whole-lever classification from the zones and raw outputs.
pub fn classify_lever(samples: &[Sample], zones: &[Zone], config: &AnalyzerConfig) -> LeverType {
    let has_gate = zones.iter().any(Zone::is_gate);
    let has_linear = zones.iter().any(|z| !z.is_gate());
    let unique = unique_outputs(samples);
    let integral = samples.iter().all(|s| is_integral(s.output));

    if integral && unique <= config.discrete_max_outputs && !has_linear {
        LeverType::Discrete
    } else if unique >= config.continuous_min_outputs && !has_gate {
        LeverType::Continuous
    } else if has_gate && has_linear {
        LeverType::Hybrid
    } else if has_linear {
        LeverType::Continuous
    } else {
        LeverType::Discrete
    }
}

pub(crate) fn is_integral(value: f64) -> bool {
    (value - value.round()).abs() < 0.01
}

fn unique_outputs(samples: &[Sample]) -> usize {
    samples
        .iter()
        .map(|s| (s.output * 1000.0).round() as i64)
        .collect::<HashSet<_>>()
        .len()
}

/// Notch suggestions in input order. Hardware boundaries sit halfway between
/// neighbouring zones; the first zone starts at 0.0 and the last ends at 1.0.
pub fn suggest_notches(zones: &[Zone]) -> Vec<NotchSuggestion> {
    zones
        .iter()
        .enumerate()
        .map(|(i, zone)| {
            let input_min = match i.checked_sub(1).and_then(|p| zones.get(p)) {
                Some(prev) => round2((prev.set_input_max + zone.set_input_min) / 2.0),
                None => 0.0,
            };
            let input_max = match zones.get(i + 1) {
                Some(next) => round2((zone.set_input_max + next.set_input_min) / 2.0),
                None => 1.0,
            };
            let sim_input_min = round2(zone.set_input_min);
            let sim_input_max = round2(zone.set_input_max);
            let (kind, description) = match zone.kind {
                ZoneKind::Gate { value } => {
                    let value = round2(value);
                    (
                        NotchKind::Gate { value },
                        format!("Gate at {value:.2} (input {input_min:.2}-{input_max:.2})"),
                    )
                }
                ZoneKind::Linear {
                    output_min,
                    output_max,
                } => {
                    let (min_value, max_value) = (round2(output_min), round2(output_max));
                    (
                        NotchKind::Linear {
                            min_value,
                            max_value,
                        },
                        format!(
                            "Linear {min_value:.2} to {max_value:.2} (input {input_min:.2}-{input_max:.2})"
                        ),
                    )
                }
            };
            NotchSuggestion {
                index: u32::try_from(i).unwrap_or(u32::MAX),
                kind,
                input_min,
                input_max,
                sim_input_min,
                sim_input_max,
                description,
            }
        })
        .collect()
}
