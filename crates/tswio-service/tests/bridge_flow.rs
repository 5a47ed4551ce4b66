//! End-to-end bridge behavior: a mock board and a mock simulator, with the
//! bridge routing readings for whichever train is being driven.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    CONFIG_ID, DETECTION_PATH, HORN_PIN, SANDER_LAMP_PIN, THROTTLE_PIN, TRANSPORT, class_66,
    layout,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tswio_protocol::{
    ConfigurationStored, DeactivateBldcProfile, FirmwareVersion, IdentityResponse, InputValue,
    Message, OutputLevel, SetOutput,
};
use tswio_service::{
    Activation, Bridge, BridgeConfig, InMemoryRepository, Repository, TrainChange, TrainWatcher,
};
use tswio_test_helpers::keystroke::RecordingKeystrokeSink;
use tswio_test_helpers::must;
use tswio_test_helpers::simulator::MockSimulator;
use tswio_test_helpers::transport::MockTransport;

const SANDER: &str = "Sander.Function.Value";

struct Rig {
    sim: MockSimulator,
    repository: Arc<InMemoryRepository>,
    bridge: Arc<Bridge>,
}

fn rig() -> Rig {
    let sim = MockSimulator::new();
    let repository = Arc::new(must(InMemoryRepository::new(layout())));
    let bridge = Bridge::new(
        BridgeConfig::default(),
        Arc::new(sim.clone()),
        Arc::new(RecordingKeystrokeSink::new()),
        repository.clone(),
    );
    Rig {
        sim,
        repository,
        bridge,
    }
}

async fn connect(bridge: &Arc<Bridge>, reported_config: u32) -> (Arc<MockTransport>, JoinHandle<()>) {
    let transport = MockTransport::new(TRANSPORT);
    transport.push_message(IdentityResponse {
        request_id: 1,
        version: FirmwareVersion::new(1, 4, 0),
        config_id: reported_config,
    });
    transport.push_message(ConfigurationStored { config_id: CONFIG_ID });
    let session = must(bridge.connect_device(transport.clone()).await);
    (transport, session)
}

fn lamp(level: OutputLevel) -> Message {
    Message::SetOutput(SetOutput {
        pin: SANDER_LAMP_PIN,
        value: level,
    })
}

fn configure_parts(transport: &MockTransport) -> usize {
    transport
        .sent_messages()
        .iter()
        .filter(|m| matches!(m, Message::Configure(_)))
        .count()
}

#[tokio::test(start_paused = true)]
async fn current_boards_are_not_reconfigured() {
    let rig = rig();
    let (transport, _session) = connect(&rig.bridge, CONFIG_ID).await;
    assert_eq!(configure_parts(&transport), 0);
    assert!(rig.bridge.registry().is_attached(TRANSPORT));
}

#[tokio::test(start_paused = true)]
async fn stale_boards_receive_the_stored_configuration() {
    let rig = rig();
    let (transport, _session) = connect(&rig.bridge, 3).await;
    assert_eq!(configure_parts(&transport), 2);
}

#[tokio::test(start_paused = true)]
async fn unknown_boards_are_refused() {
    let rig = rig();
    let transport = MockTransport::new("tcp://10.0.0.9:5000");
    assert!(rig.bridge.connect_device(transport.clone()).await.is_err());
    assert!(transport.sent_messages().is_empty());
    assert!(rig.bridge.registry().device_names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn active_train_routes_buttons_levers_and_outputs() {
    let rig = rig();
    let (transport, session) = connect(&rig.bridge, CONFIG_ID).await;
    rig.sim.set_value(SANDER, 0.9);

    let activation = must(rig.bridge.activate(&class_66()).await);
    assert_eq!(
        activation,
        Activation {
            buttons: 1,
            levers: 1,
            bldc_profiles: 1,
            outputs: 1,
        }
    );

    transport.push_message(InputValue {
        pin: HORN_PIN,
        value: 1,
    });
    transport.push_message(InputValue {
        pin: THROTTLE_PIN,
        value: 600,
    });
    sleep(Duration::from_millis(50)).await;

    assert_eq!(rig.sim.values_written("Horn.InputValue"), vec![1.0]);
    assert_eq!(rig.sim.values_written("Throttle.InputValue"), vec![0.5]);
    let sent = transport.sent_messages();
    assert!(
        sent.iter()
            .any(|m| matches!(m, Message::LoadBldcProfile(p) if p.pin == THROTTLE_PIN))
    );
    assert!(sent.contains(&lamp(OutputLevel::High)));

    transport.clear_sent();
    rig.bridge.deactivate().await;
    assert_eq!(rig.bridge.lever_count(), 0);
    assert_eq!(rig.bridge.buttons().binding_count(), 0);
    let sent = transport.sent_messages();
    assert!(sent.contains(&Message::DeactivateBldcProfile(DeactivateBldcProfile {
        pin: THROTTLE_PIN
    })));
    assert!(sent.contains(&lamp(OutputLevel::Low)));

    transport.push_message(InputValue {
        pin: HORN_PIN,
        value: 0,
    });
    transport.push_message(InputValue {
        pin: THROTTLE_PIN,
        value: 900,
    });
    sleep(Duration::from_millis(50)).await;
    assert_eq!(rig.sim.values_written("Horn.InputValue"), vec![1.0]);
    assert_eq!(rig.sim.values_written("Throttle.InputValue"), vec![0.5]);

    transport.hang_up();
    must(session.await);
    assert!(!rig.bridge.registry().is_attached(TRANSPORT));
    assert!(rig.bridge.buttons().input_index().is_empty());
}

#[tokio::test(start_paused = true)]
async fn profiles_reach_boards_that_attach_after_activation() {
    let rig = rig();
    let activation = must(rig.bridge.activate(&class_66()).await);
    assert_eq!(activation.bldc_profiles, 0);

    let (transport, _session) = connect(&rig.bridge, CONFIG_ID).await;
    assert!(
        transport
            .sent_messages()
            .iter()
            .any(|m| matches!(m, Message::LoadBldcProfile(p) if p.pin == THROTTLE_PIN))
    );
}

#[tokio::test(start_paused = true)]
async fn calibration_sweeps_are_stored() {
    let rig = rig();
    let (transport, _session) = connect(&rig.bridge, CONFIG_ID).await;

    rig.bridge.begin_calibration("desk/throttle");
    for value in [120, 300, 520, 760, 905] {
        transport.push_message(InputValue {
            pin: THROTTLE_PIN,
            value,
        });
    }
    sleep(Duration::from_millis(20)).await;

    let calibration = must(rig.bridge.finish_calibration("desk/throttle").await);
    assert_eq!((calibration.min, calibration.max), (120, 905));
    assert!(!calibration.rollover);

    let device = must(rig.repository.device(TRANSPORT).await);
    let stored = device.input("desk/throttle").and_then(|i| i.calibration);
    assert_eq!(stored, Some(calibration));

    assert!(rig.bridge.finish_calibration("desk/throttle").await.is_err());
}

#[tokio::test]
async fn watcher_reports_only_train_changes() {
    let rig = rig();
    let mut watcher = TrainWatcher::new(
        Arc::new(rig.sim.clone()),
        rig.repository.clone(),
        DETECTION_PATH,
    );

    assert_eq!(watcher.poll_once().await, None, "no formation yet");

    rig.sim.set_value(DETECTION_PATH, "RVM_DB_Class66_C_2147");
    assert_eq!(
        watcher.poll_once().await,
        Some(TrainChange::Activated(class_66()))
    );
    assert_eq!(watcher.poll_once().await, None);
    assert_eq!(watcher.active(), Some("class66"));

    rig.sim.fail_gets(DETECTION_PATH, 1);
    assert_eq!(watcher.poll_once().await, None, "read failures keep the train");
    assert_eq!(watcher.active(), Some("class66"));

    rig.sim.set_value(DETECTION_PATH, "RVM_DB_Class43_C_1");
    assert_eq!(watcher.poll_once().await, Some(TrainChange::Deactivated));
    assert_eq!(watcher.poll_once().await, None);
}

#[tokio::test(start_paused = true)]
async fn run_loop_follows_the_driven_train() {
    let rig = rig();
    let watcher = TrainWatcher::new(
        Arc::new(rig.sim.clone()),
        rig.repository.clone(),
        DETECTION_PATH,
    );
    rig.sim.set_value(DETECTION_PATH, "RVM_DB_Class66_C_2147");

    let (stop, stopped) = oneshot::channel::<()>();
    let runner = {
        let bridge = Arc::clone(&rig.bridge);
        tokio::spawn(async move {
            bridge
                .run(watcher, async move { stopped.await.unwrap_or(()) })
                .await;
        })
    };

    sleep(Duration::from_millis(10)).await;
    assert_eq!(rig.bridge.active_train().await, Some(class_66()));

    rig.sim.set_value(DETECTION_PATH, "RVM_DB_Class43_C_1");
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(rig.bridge.active_train().await, None);

    rig.sim.set_value(DETECTION_PATH, "RVM_DB_Class66_C_9");
    sleep(Duration::from_millis(1100)).await;
    assert_eq!(rig.bridge.active_train().await, Some(class_66()));

    must(stop.send(()));
    must(runner.await);
    assert_eq!(rig.bridge.active_train().await, None);
}
