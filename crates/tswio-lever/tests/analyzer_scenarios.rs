//! Analyzer runs against scripted levers.

use std::sync::Arc;

use tswio_lever::{
    AnalyzerConfig, BldcParams, CalibrationError, LeverAnalyzer, LeverConfig, LeverEndpoints,
    LeverType, NotchKind, ZoneKind, map_input, profile_for_lever, quick_check,
};
use tswio_simulator::SimulatorClient;
use tswio_test_helpers::assert_approx_eq;
use tswio_test_helpers::prelude::*;

const CONTROL: &str = "CurrentDrivableActor/Throttle(Lever)";

fn rig<F>(response: F) -> (MockSimulator, LeverEndpoints, LeverAnalyzer)
where
    F: Fn(f64) -> (f64, f64) + Send + Sync + 'static,
{
    let endpoints = LeverEndpoints::for_control(CONTROL);
    let sim = MockSimulator::new();
    sim.add_lever(&endpoints.value, &endpoints.output, response);
    let client: Arc<dyn SimulatorClient> = Arc::new(sim.clone());
    let analyzer = LeverAnalyzer::new(client, AnalyzerConfig::default());
    (sim, endpoints, analyzer)
}

#[tokio::test(start_paused = true)]
async fn gate_ramp_gate_yields_three_zones() {
    let (_sim, endpoints, analyzer) = rig(three_zone_response);
    let report = must(analyzer.analyze(&endpoints).await);

    let kinds: Vec<bool> = report.zones.iter().map(|z| z.is_gate()).collect();
    assert_eq!(kinds, vec![true, false, true]);
    assert_eq!(report.lever_type, LeverType::Hybrid);
    assert_eq!(report.skipped_samples, 0);
    assert_eq!(report.samples.len(), 51);

    match (report.zones.first().map(|z| z.kind), report.zones.last().map(|z| z.kind)) {
        (Some(ZoneKind::Gate { value: low }), Some(ZoneKind::Gate { value: high })) => {
            assert_approx_eq!(low, -1.0, 1e-9);
            assert_approx_eq!(high, 1.0, 1e-9);
        }
        other => panic!("unexpected end zones: {other:?}"),
    }

    let bounds: Vec<(f64, f64)> = report
        .suggestions
        .iter()
        .map(|s| (s.input_min, s.input_max))
        .collect();
    assert_eq!(bounds, vec![(0.0, 0.21), (0.21, 0.81), (0.81, 1.0)]);
    assert!(matches!(
        report.suggestions.get(1).map(|s| s.kind),
        Some(NotchKind::Linear { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn suggestions_feed_the_mapper() {
    let (_sim, endpoints, analyzer) = rig(three_zone_response);
    let report = must(analyzer.analyze(&endpoints).await);
    let config = must(LeverConfig::new(endpoints, report.lever_type, report.notches()));

    // Gates map to the middle of the simulator range they were found at.
    assert_approx_eq!(must(map_input(&config, 0.05)), 0.1, 1e-9);
    assert_eq!(map_input(&config, 0.2), map_input(&config, 0.05));
    assert_approx_eq!(must(map_input(&config, 1.0)), 0.91, 1e-9);

    let mid = must(map_input(&config, 0.51));
    assert!((0.22..=0.8).contains(&mid), "linear mapping out of range: {mid}");

    let profile = must(profile_for_lever(4, &config, &BldcParams::default()));
    assert_eq!(profile.detents.len(), 2);
    assert_eq!(profile.ranges.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn snapping_detents_are_confirmed_live() {
    let (sim, endpoints, analyzer) = rig(discrete_response(5));
    let report = must(analyzer.analyze(&endpoints).await);

    assert_eq!(report.zones.len(), 5);
    assert!(report.zones.iter().all(|z| z.is_gate()));
    assert_eq!(report.lever_type, LeverType::Discrete);
    assert!(report.samples.iter().any(|s| s.snapped));

    // Each of the four boundaries is driven from both sides.
    let writes = sim.values_written(&endpoints.value).len();
    let sweep_and_init = 3 + 51;
    let boundary_writes = 4 * 2 * (3 + 1);
    assert_eq!(writes, sweep_and_init + boundary_writes + 1);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_boundary_is_merged() {
    let (_sim, endpoints, analyzer) = rig(stepped_gate_response(vec![0.0, 0.22]));
    let report = must(analyzer.analyze(&endpoints).await);
    assert_eq!(report.zones.len(), 1, "zones: {:?}", report.zones);
}

fn assert_single_linear(report: &tswio_lever::AnalysisReport) {
    assert_eq!(report.zones.len(), 1, "zones: {:?}", report.zones);
    let zone = must_some(report.zones.first(), "one zone");
    match zone.kind {
        ZoneKind::Linear {
            output_min,
            output_max,
        } => {
            assert_approx_eq!(output_min, 0.0, 1e-9);
            assert_approx_eq!(output_max, 1.0, 1e-9);
        }
        other => panic!("expected a linear zone, got {other:?}"),
    }
    assert_approx_eq!(zone.set_input_min, 0.0, 1e-9);
    assert_approx_eq!(zone.set_input_max, 1.0, 1e-9);
    assert_eq!(report.lever_type, LeverType::Continuous);
}

#[tokio::test(start_paused = true)]
async fn quantized_continuous_lever_is_one_linear_zone() {
    // Output moves in 0.05 steps, so short plateaus look like gates,
    // including two samples holding 1.0 at the top of travel.
    let (sim, endpoints, analyzer) = rig(|x: f64| {
        let x = x.clamp(0.0, 1.0);
        (x, (x * 20.0).round() / 20.0)
    });
    let report = must(analyzer.analyze(&endpoints).await);
    assert_single_linear(&report);

    // Every candidate boundary was driven from both sides before merging.
    let writes = sim.values_written(&endpoints.value).len();
    assert!(writes > 3 + 51 + 1, "no boundary was driven: {writes} writes");
    assert_eq!((writes - (3 + 51 + 1)) % (2 * (3 + 1)), 0);
}

#[tokio::test(start_paused = true)]
async fn briefly_stalled_lever_is_one_linear_zone() {
    let (_sim, endpoints, analyzer) = rig(|x: f64| {
        let x = x.clamp(0.0, 1.0);
        (x, if (0.4..=0.46).contains(&x) { 0.4 } else { x })
    });
    let report = must(analyzer.analyze(&endpoints).await);
    assert_single_linear(&report);
}

#[tokio::test(start_paused = true)]
async fn gate_to_ramp_boundaries_are_checked_live() {
    let (sim, endpoints, analyzer) = rig(three_zone_response);
    let report = must(analyzer.analyze(&endpoints).await);
    assert_eq!(report.zones.len(), 3);

    let writes = sim.values_written(&endpoints.value).len();
    let boundary_writes = 2 * 2 * (3 + 1);
    assert_eq!(writes, 3 + 51 + boundary_writes + 1);
}

#[tokio::test(start_paused = true)]
async fn transient_read_failures_are_skipped() {
    let (sim, endpoints, analyzer) = rig(three_zone_response);
    sim.fail_gets(&endpoints.output, 5);
    let report = must(analyzer.analyze(&endpoints).await);
    assert_eq!(report.skipped_samples, 5);
    assert_eq!(report.samples.len(), 46);
}

#[tokio::test(start_paused = true)]
async fn too_few_samples_is_an_error() {
    let (sim, endpoints, analyzer) = rig(three_zone_response);
    sim.fail_always(&endpoints.output);
    let result = analyzer.analyze(&endpoints).await;
    assert_eq!(
        result.map(|r| r.zones.len()),
        Err(CalibrationError::InsufficientSamples {
            got: 0,
            required: 10
        })
    );
}

#[tokio::test(start_paused = true)]
async fn original_position_is_restored() {
    let (sim, endpoints, analyzer) = rig(three_zone_response);
    sim.set_value(&endpoints.value, 0.37);
    sim.set_value(&endpoints.notch_count, 3.0);
    let report = must(analyzer.analyze(&endpoints).await);
    assert_eq!(report.reported_notch_count, Some(3));
    assert_eq!(sim.values_written(&endpoints.value).last().copied(), Some(0.37));
}

#[tokio::test(start_paused = true)]
async fn sweep_respects_settling_time() {
    let (sim, endpoints, analyzer) = rig(three_zone_response);
    let start = tokio::time::Instant::now();
    must(analyzer.analyze(&endpoints).await);

    let writes = sim.writes();
    let first_sweep = must_some(writes.get(3), "sweep write");
    // Three nudges 30 ms apart, then one settle period.
    assert_eq!(first_sweep.at - start, std::time::Duration::from_millis(240));
    let second = must_some(writes.get(4), "second sweep write");
    assert_eq!(second.at - first_sweep.at, std::time::Duration::from_millis(150));
}

async fn quick_type<F>(response: F) -> LeverType
where
    F: Fn(f64) -> (f64, f64) + Send + Sync + 'static,
{
    let endpoints = LeverEndpoints::for_control(CONTROL);
    let sim = MockSimulator::new();
    sim.add_lever(&endpoints.value, &endpoints.output, response);
    let check = must(quick_check(Arc::new(sim.clone()), CONTROL).await);
    assert_eq!(check.samples.len(), 5);
    assert_eq!(sim.values_written(&endpoints.value).len(), 6, "five points and a restore");
    check.lever_type
}

#[tokio::test(start_paused = true)]
async fn quick_check_classifies() {
    assert_eq!(quick_type(three_zone_response).await, LeverType::Hybrid);
    assert_eq!(quick_type(discrete_response(5)).await, LeverType::Discrete);
    assert_eq!(quick_type(|x: f64| (x, x * 0.7 + 0.1)).await, LeverType::Continuous);
}

#[tokio::test(start_paused = true)]
async fn quick_check_needs_two_samples() {
    let (sim, endpoints, analyzer) = rig(three_zone_response);
    sim.fail_gets(&endpoints.output, 4);
    let result = analyzer.quick_check(&endpoints).await;
    assert_eq!(
        result.map(|c| c.samples.len()),
        Err(CalibrationError::InsufficientSamples {
            got: 1,
            required: 2
        })
    );
}
