//! Device handshake, configuration upload and the receive loop

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};
use tswio_errors::{TransportError, TswIoError};
use tswio_protocol::{Configure, IdentityRequest, IdentityResponse, InputConfig, Message};
use tswio_transport::{DeviceTransport, DeviceTransportExt};

/// Connection failures that end a device session.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Device(#[from] TswIoError),

    #[error("device {transport} rejected configuration {config_id}")]
    ConfigurationRejected { transport: String, config_id: u32 },
}

impl From<TransportError> for ConnectionError {
    fn from(error: TransportError) -> Self {
        ConnectionError::Device(error.into())
    }
}

/// Receives decoded input readings from a device session.
#[async_trait]
pub trait InputSink: Send + Sync {
    async fn on_input(&self, transport: &str, pin: u8, value: i16);
}

/// Wait for the first message `select` accepts. Anything else that arrives
/// in the meantime is logged and dropped.
async fn await_reply<T, F>(
    transport: &dyn DeviceTransport,
    limit: Duration,
    mut select: F,
) -> Result<T, ConnectionError>
where
    F: FnMut(Message) -> Option<T>,
{
    let wait = async {
        loop {
            let message = match transport.recv_message().await {
                Ok(message) => message,
                Err(TswIoError::Protocol(e)) => {
                    warn!(transport = transport.name(), error = %e, "undecodable frame");
                    continue;
                }
                Err(e) => return Err(ConnectionError::Device(e)),
            };
            let tag = message.tag();
            match select(message) {
                Some(reply) => return Ok(reply),
                None => debug!(transport = transport.name(), tag, "ignoring message while waiting"),
            }
        }
    };
    match timeout(limit, wait).await {
        Ok(result) => result,
        Err(_elapsed) => Err(TransportError::Timeout {
            transport: transport.name().to_string(),
            timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }
        .into()),
    }
}

/// Ask the board who it is.
pub async fn handshake(
    transport: &dyn DeviceTransport,
    request_id: u32,
    limit: Duration,
) -> Result<IdentityResponse, ConnectionError> {
    transport
        .send_message(&Message::IdentityRequest(IdentityRequest { request_id }))
        .await?;
    let identity = await_reply(transport, limit, |message| match message {
        Message::IdentityResponse(r) if r.request_id == request_id => Some(r),
        _ => None,
    })
    .await?;
    info!(
        transport = transport.name(),
        version = %identity.version,
        config_id = identity.config_id,
        "device identified"
    );
    Ok(identity)
}

/// Upload `inputs` as configuration `config_id` and wait for the board to
/// store it.
pub async fn upload_configuration(
    transport: &dyn DeviceTransport,
    config_id: u32,
    inputs: &[InputConfig],
    limit: Duration,
) -> Result<(), ConnectionError> {
    let parts = Configure::split_parts(config_id, inputs).map_err(TswIoError::from)?;
    info!(transport = transport.name(), config_id, parts = parts.len(), "uploading configuration");
    for part in parts {
        transport.send_message(&Message::Configure(part)).await?;
    }
    let stored = await_reply(transport, limit, |message| match message {
        Message::ConfigurationStored(s) if s.config_id == config_id => Some(true),
        Message::ConfigurationError(e) if e.config_id == config_id => Some(false),
        _ => None,
    })
    .await?;
    if !stored {
        return Err(ConnectionError::ConfigurationRejected {
            transport: transport.name().to_string(),
            config_id,
        });
    }
    info!(transport = transport.name(), config_id, "configuration stored");
    Ok(())
}

/// Tracks heartbeat arrival for one device.
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    last: Instant,
    limit: Duration,
    stale: bool,
}

impl HeartbeatMonitor {
    pub fn new(limit: Duration) -> Self {
        Self {
            last: Instant::now(),
            limit,
            stale: false,
        }
    }

    /// Record a heartbeat. Returns true when the device was stale.
    pub fn beat(&mut self) -> bool {
        self.last = Instant::now();
        std::mem::replace(&mut self.stale, false)
    }

    /// Returns the silence duration the first time it exceeds the limit.
    pub fn check(&mut self) -> Option<Duration> {
        let silence = self.last.elapsed();
        if self.stale || silence <= self.limit {
            return None;
        }
        self.stale = true;
        Some(silence)
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

/// Route input readings until the transport closes.
///
/// Undecodable frames are skipped. A stale heartbeat is reported once per
/// silence and does not end the session.
pub async fn receive_loop(
    transport: &dyn DeviceTransport,
    sink: &dyn InputSink,
    heartbeat_timeout: Duration,
) -> Result<(), ConnectionError> {
    let name = transport.name();
    let mut heartbeat = HeartbeatMonitor::new(heartbeat_timeout);
    let mut ticker = interval(heartbeat_timeout / 2);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // A frame read must never be abandoned halfway, so the pending receive
    // survives ticker wake-ups.
    let mut pending = transport.recv_message();
    loop {
        tokio::select! {
            received = &mut pending => {
                pending = transport.recv_message();
                match received {
                    Ok(Message::InputValue(input)) => {
                        sink.on_input(name, input.pin, input.value).await;
                    }
                    Ok(Message::Heartbeat(_)) => {
                        if heartbeat.beat() {
                            info!(transport = name, "heartbeat resumed");
                        }
                    }
                    Ok(other) => debug!(transport = name, tag = other.tag(), "unexpected message"),
                    Err(TswIoError::Protocol(e)) => {
                        warn!(transport = name, error = %e, "undecodable frame");
                    }
                    Err(TswIoError::Transport(TransportError::Closed(_))) => {
                        info!(transport = name, "device disconnected");
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            _ = ticker.tick() => {
                if let Some(silence) = heartbeat.check() {
                    warn!(transport = name, silence_ms = silence.as_millis(), "device heartbeat stale");
                }
            }
        }
    }
}
