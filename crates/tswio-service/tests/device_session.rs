//! Handshake, configuration upload, receive loop and output polling
//! against an in-memory board.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{SANDER_LAMP_PIN, TRANSPORT, desk, layout};
use parking_lot::Mutex;
use tswio_errors::{TransportError, TswIoError};
use tswio_protocol::{
    ConfigurationError, ConfigurationStored, FirmwareVersion, Heartbeat, IdentityResponse,
    InputValue, Message, OutputLevel, SetOutput,
};
use tswio_service::{
    ConnectionError, DeviceRegistry, InputSink, OutputMonitor, handshake, receive_loop,
    upload_configuration,
};
use tswio_test_helpers::must;
use tswio_test_helpers::simulator::MockSimulator;
use tswio_test_helpers::transport::MockTransport;

const LIMIT: Duration = Duration::from_secs(2);

fn identity(request_id: u32, config_id: u32) -> IdentityResponse {
    IdentityResponse {
        request_id,
        version: FirmwareVersion::new(1, 4, 0),
        config_id,
    }
}

#[tokio::test]
async fn handshake_waits_for_the_matching_response() {
    let transport = MockTransport::new(TRANSPORT);
    transport.push_message(Heartbeat);
    transport.push_message(identity(41, 3));
    transport.push_message(identity(42, 3));

    let response = must(handshake(transport.as_ref(), 42, LIMIT).await);
    assert_eq!(response, identity(42, 3));
    assert!(matches!(
        transport.sent_messages().as_slice(),
        [Message::IdentityRequest(r)] if r.request_id == 42
    ));
}

#[tokio::test(start_paused = true)]
async fn silent_boards_time_out() {
    let transport = MockTransport::new(TRANSPORT);
    let result = handshake(transport.as_ref(), 1, LIMIT).await;
    assert!(matches!(
        result,
        Err(ConnectionError::Device(TswIoError::Transport(
            TransportError::Timeout { timeout_ms: 2000, .. }
        )))
    ));
}

#[tokio::test]
async fn upload_sends_every_part_and_waits_for_storage() {
    let transport = MockTransport::new(TRANSPORT);
    transport.push_message(ConfigurationStored { config_id: 6 });
    transport.push_message(ConfigurationStored { config_id: 7 });

    let inputs = desk().input_configs();
    must(upload_configuration(transport.as_ref(), 7, &inputs, LIMIT).await);

    let parts: Vec<(u8, u8)> = transport
        .sent_messages()
        .iter()
        .filter_map(|m| match m {
            Message::Configure(c) if c.config_id == 7 => Some((c.part_number, c.total_parts)),
            _ => None,
        })
        .collect();
    assert_eq!(parts, vec![(0, 2), (1, 2)]);
}

#[tokio::test]
async fn rejected_uploads_are_reported() {
    let transport = MockTransport::new(TRANSPORT);
    transport.push_message(ConfigurationError { config_id: 7 });

    let result = upload_configuration(transport.as_ref(), 7, &desk().input_configs(), LIMIT).await;
    assert!(matches!(
        result,
        Err(ConnectionError::ConfigurationRejected { config_id: 7, .. })
    ));
}

#[derive(Default)]
struct RecordingSink {
    readings: Mutex<Vec<(String, u8, i16)>>,
}

#[async_trait]
impl InputSink for RecordingSink {
    async fn on_input(&self, transport: &str, pin: u8, value: i16) {
        self.readings.lock().push((transport.to_string(), pin, value));
    }
}

#[tokio::test]
async fn receive_loop_routes_readings_until_hang_up() {
    let transport = MockTransport::new(TRANSPORT);
    let sink = RecordingSink::default();

    transport.push_message(InputValue { pin: 2, value: 1 });
    transport.push_frame(vec![0xEE, 0x01]);
    transport.push_message(Heartbeat);
    transport.push_message(InputValue { pin: 14, value: 512 });
    transport.hang_up();

    must(receive_loop(transport.as_ref(), &sink, Duration::from_secs(3)).await);
    assert_eq!(
        *sink.readings.lock(),
        vec![(TRANSPORT.to_string(), 2, 1), (TRANSPORT.to_string(), 14, 512)]
    );
}

fn monitor(sim: &MockSimulator, transport: &Arc<MockTransport>) -> OutputMonitor {
    let registry = Arc::new(DeviceRegistry::new());
    registry.attach(transport.clone(), &desk());
    let outputs = layout()
        .trains
        .into_iter()
        .flat_map(|t| t.outputs)
        .collect();
    OutputMonitor::new(outputs, Arc::new(sim.clone()), registry)
}

fn lamp(level: OutputLevel) -> Message {
    Message::SetOutput(SetOutput {
        pin: SANDER_LAMP_PIN,
        value: level,
    })
}

#[tokio::test]
async fn outputs_follow_threshold_crossings() {
    let sim = MockSimulator::new();
    let transport = MockTransport::new(TRANSPORT);
    let mut monitor = monitor(&sim, &transport);

    assert_eq!(monitor.poll_once().await, 0, "endpoint not readable yet");

    sim.set_value("Sander.Function.Value", 0.2);
    assert_eq!(monitor.poll_once().await, 1);
    assert_eq!(monitor.poll_once().await, 0);

    sim.set_value("Sander.Function.Value", 0.9);
    assert_eq!(monitor.poll_once().await, 1);
    assert_eq!(
        transport.sent_messages(),
        vec![lamp(OutputLevel::Low), lamp(OutputLevel::High)]
    );
}

#[tokio::test]
async fn failed_output_sends_are_retried() {
    let sim = MockSimulator::new().with_value("Sander.Function.Value", 1.0);
    let transport = MockTransport::new(TRANSPORT);
    let mut monitor = monitor(&sim, &transport);

    transport.set_fail_sends(true);
    assert_eq!(monitor.poll_once().await, 0);

    transport.set_fail_sends(false);
    assert_eq!(monitor.poll_once().await, 1);
    assert_eq!(transport.sent_messages(), vec![lamp(OutputLevel::High)]);
}
