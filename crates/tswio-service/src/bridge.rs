//! The bridge: routes device readings to buttons and levers and swaps the
//! active train's bindings when the driven train changes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, info, trace, warn};
use tswio_buttons::{ButtonController, InputKind};
use tswio_calibration::{Calibration, CalibrationSession, DEFAULT_MAX_HARDWARE_VALUE};
use tswio_keystroke::KeystrokeSink;
use tswio_lever::profile_for_lever;
use tswio_protocol::{DeactivateBldcProfile, LoadBldcProfile, Message, OutputLevel, SetOutput};
use tswio_simulator::SimulatorClient;
use tswio_transport::DeviceTransport;

use crate::config::BridgeConfig;
use crate::connection::{InputSink, handshake, receive_loop, upload_configuration};
use crate::levers::{self, LeverHandle, LeverState, uncalibrated};
use crate::observability::{device_span, train_span};
use crate::outputs::{OutputBinding, OutputMonitor};
use crate::registry::DeviceRegistry;
use crate::repository::{DeviceRecord, InputRecord, LeverElement, Repository, TrainRecord, locate_input};
use crate::train::{TrainChange, TrainWatcher};

/// What an activation loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activation {
    pub buttons: usize,
    pub levers: usize,
    pub bldc_profiles: usize,
    pub outputs: usize,
}

struct ActiveTrain {
    train: TrainRecord,
    profiles: Vec<(String, LoadBldcProfile)>,
    outputs: Vec<OutputBinding>,
    monitor: Option<JoinHandle<()>>,
}

pub struct Bridge {
    config: BridgeConfig,
    simulator: Arc<dyn SimulatorClient>,
    repository: Arc<dyn Repository>,
    registry: Arc<DeviceRegistry>,
    buttons: ButtonController,
    levers: RwLock<Arc<HashMap<String, LeverHandle>>>,
    active: tokio::sync::Mutex<Option<ActiveTrain>>,
    calibrations: Mutex<HashMap<String, CalibrationSession>>,
    next_request_id: AtomicU32,
}

impl Bridge {
    pub fn new(
        config: BridgeConfig,
        simulator: Arc<dyn SimulatorClient>,
        keystrokes: Arc<dyn KeystrokeSink>,
        repository: Arc<dyn Repository>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            buttons: ButtonController::new(Arc::clone(&simulator), keystrokes),
            simulator,
            repository,
            registry: Arc::new(DeviceRegistry::new()),
            levers: RwLock::new(Arc::new(HashMap::new())),
            active: tokio::sync::Mutex::new(None),
            calibrations: Mutex::new(HashMap::new()),
            next_request_id: AtomicU32::new(1),
        })
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn buttons(&self) -> &ButtonController {
        &self.buttons
    }

    pub async fn active_train(&self) -> Option<TrainRecord> {
        self.active.lock().await.as_ref().map(|a| a.train.clone())
    }

    pub fn lever_count(&self) -> usize {
        self.levers.read().len()
    }

    /// Identify a device, bring its configuration up to date and start
    /// routing its readings. The returned task ends when the device
    /// disconnects, at which point it is detached again.
    pub async fn connect_device(
        self: &Arc<Self>,
        transport: Arc<dyn DeviceTransport>,
    ) -> Result<JoinHandle<()>> {
        let name = transport.name().to_string();
        let record = self
            .repository
            .device(&name)
            .await
            .with_context(|| format!("No device configured for {name}"))?;

        let devices = &self.config.devices;
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let identity = handshake(transport.as_ref(), request_id, devices.identity_timeout())
            .await
            .with_context(|| format!("Handshake with {name} failed"))?;

        if identity.config_id == record.config_id {
            debug!(transport = %name, config_id = record.config_id, "device configuration current");
        } else {
            upload_configuration(
                transport.as_ref(),
                record.config_id,
                &record.input_configs(),
                devices.configure_timeout(),
            )
            .await
            .with_context(|| format!("Configuration upload to {name} failed"))?;
        }

        let index = self.registry.attach(Arc::clone(&transport), &record);
        self.buttons.set_input_index(index);
        self.push_profiles(&name).await;

        let bridge = Arc::clone(self);
        let heartbeat_timeout = devices.heartbeat_timeout();
        let span = device_span(&name);
        Ok(tokio::spawn(
            async move {
                if let Err(e) = receive_loop(transport.as_ref(), bridge.as_ref(), heartbeat_timeout).await {
                    warn!(error = %e, "device session ended with an error");
                }
                let index = bridge.registry.detach(&name);
                bridge.buttons.set_input_index(index);
            }
            .instrument(span),
        ))
    }

    /// Send the active train's BLDC profiles for a device that just attached.
    async fn push_profiles(&self, transport: &str) {
        let profiles: Vec<LoadBldcProfile> = match self.active.lock().await.as_ref() {
            Some(active) => active
                .profiles
                .iter()
                .filter(|(t, _)| t == transport)
                .map(|(_, p)| p.clone())
                .collect(),
            None => return,
        };
        for profile in profiles {
            let pin = profile.pin;
            if let Err(e) = self
                .registry
                .send(transport, &Message::LoadBldcProfile(profile))
                .await
            {
                warn!(transport, pin, error = %e, "failed to load BLDC profile");
            }
        }
    }

    /// Load everything bound to `train`, replacing whatever was active.
    pub async fn activate(&self, train: &TrainRecord) -> Result<Activation> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            self.teardown(previous).await;
        }

        let span = train_span(&train.id);
        let (next, activation) = self.load_train(train).instrument(span).await?;
        *active = Some(next);
        info!(
            train_id = %train.id,
            buttons = activation.buttons,
            levers = activation.levers,
            bldc = activation.bldc_profiles,
            outputs = activation.outputs,
            "train activated"
        );
        Ok(activation)
    }

    async fn load_train(&self, train: &TrainRecord) -> Result<(ActiveTrain, Activation)> {
        let repository = &self.repository;
        let sequences = repository.sequences().await.context("Failed to load sequences")?;
        let bindings = repository
            .button_bindings(&train.id)
            .await
            .context("Failed to load button bindings")?;
        let lever_elements = repository
            .lever_elements(&train.id)
            .await
            .context("Failed to load levers")?;
        let outputs = repository
            .output_bindings(&train.id)
            .await
            .context("Failed to load output bindings")?;
        let devices = repository.devices().await.context("Failed to load devices")?;

        let buttons = self.buttons.load_records(
            &bindings,
            &sequences,
            &self.config.buttons.binding_defaults(),
        );

        let mut handles = HashMap::with_capacity(lever_elements.len());
        let mut profiles = Vec::new();
        for lever in lever_elements {
            if handles.contains_key(&lever.input_id) {
                warn!(element_id = %lever.element_id, input = %lever.input_id, "input already drives a lever, skipping");
                continue;
            }
            let located = locate_input(&devices, &lever.input_id);
            if let Some((device, input)) = located {
                if let Some(profile) = bldc_profile(device, input, &lever) {
                    profiles.push((device.transport.clone(), profile));
                }
            }
            let calibration = located
                .and_then(|(_, input)| input.calibration)
                .unwrap_or_else(uncalibrated);
            let input_id = lever.input_id.clone();
            let state = LeverState::new(lever.element_id, lever.lever, calibration);
            handles.insert(input_id, levers::spawn(state, Arc::clone(&self.simulator)));
        }
        let lever_count = handles.len();
        *self.levers.write() = Arc::new(handles);

        let mut loaded_profiles = 0;
        for (transport, profile) in &profiles {
            match self
                .registry
                .send(transport, &Message::LoadBldcProfile(profile.clone()))
                .await
            {
                Ok(()) => loaded_profiles += 1,
                Err(e) => debug!(transport = %transport, pin = profile.pin, error = %e, "BLDC profile deferred"),
            }
        }

        let monitor = OutputMonitor::new(
            outputs.clone(),
            Arc::clone(&self.simulator),
            Arc::clone(&self.registry),
        );
        let output_count = monitor.binding_count();
        let monitor = (output_count > 0).then(|| {
            monitor.spawn(Duration::from_millis(self.config.outputs.poll_interval_ms))
        });

        Ok((
            ActiveTrain {
                train: train.clone(),
                profiles,
                outputs,
                monitor,
            },
            Activation {
                buttons,
                levers: lever_count,
                bldc_profiles: loaded_profiles,
                outputs: output_count,
            },
        ))
    }

    /// Drop every binding of the active train, if any.
    pub async fn deactivate(&self) {
        let previous = self.active.lock().await.take();
        if let Some(previous) = previous {
            self.teardown(previous).await;
        }
    }

    /// Stop timers and lever tasks, release BLDC levers and switch the
    /// train's outputs off.
    async fn teardown(&self, previous: ActiveTrain) {
        self.buttons.clear();
        *self.levers.write() = Arc::new(HashMap::new());
        if let Some(monitor) = previous.monitor {
            monitor.abort();
        }

        for (transport, profile) in &previous.profiles {
            let message = Message::DeactivateBldcProfile(DeactivateBldcProfile { pin: profile.pin });
            if let Err(e) = self.registry.send(transport, &message).await {
                debug!(transport = %transport, pin = profile.pin, error = %e, "BLDC deactivate skipped");
            }
        }
        for output in previous.outputs.iter().filter(|o| o.enabled) {
            let message = Message::SetOutput(SetOutput {
                pin: output.pin,
                value: OutputLevel::Low,
            });
            if let Err(e) = self.registry.send(&output.transport, &message).await {
                debug!(output = %output.id, error = %e, "output reset skipped");
            }
        }
        info!(train_id = %previous.train.id, "train deactivated");
    }

    pub async fn apply(&self, change: TrainChange) -> Result<()> {
        match change {
            TrainChange::Activated(train) => {
                self.activate(&train).await?;
            }
            TrainChange::Deactivated => self.deactivate().await,
        }
        Ok(())
    }

    /// Poll for train changes until `shutdown` resolves, then deactivate.
    pub async fn run<S>(&self, mut watcher: TrainWatcher, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        let mut ticker = interval(Duration::from_millis(self.config.train.poll_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(change) = watcher.poll_once().await {
                        if let Err(e) = self.apply(change).await {
                            warn!(error = %format!("{e:#}"), "train change failed");
                        }
                    }
                }
                () = &mut shutdown => break,
            }
        }
        info!("shutting down");
        self.deactivate().await;
    }

    /// Start collecting raw readings of an analog input for calibration.
    pub fn begin_calibration(&self, input_id: &str) {
        self.calibrations.lock().insert(
            input_id.to_string(),
            CalibrationSession::new(DEFAULT_MAX_HARDWARE_VALUE),
        );
        info!(input = input_id, "calibration started, sweep the lever end to end");
    }

    /// Finish a calibration session and store the result.
    pub async fn finish_calibration(&self, input_id: &str) -> Result<Calibration> {
        let session = self
            .calibrations
            .lock()
            .remove(input_id)
            .with_context(|| format!("No calibration in progress for {input_id}"))?;
        let samples = session.sample_count();
        let calibration = session
            .finish()
            .with_context(|| format!("Calibration of {input_id} failed"))?;
        self.repository
            .save_calibration(input_id, calibration)
            .await
            .context("Failed to store calibration")?;
        info!(input = input_id, samples, ?calibration, "calibration stored");
        Ok(calibration)
    }
}

/// BLDC profile for a lever whose input is an analog pin with haptics
/// configured.
fn bldc_profile(
    device: &DeviceRecord,
    input: &InputRecord,
    lever: &LeverElement,
) -> Option<LoadBldcProfile> {
    let params = lever.bldc?;
    if input.kind() != InputKind::Analog {
        warn!(element_id = %lever.element_id, input = %input.id, "BLDC lever bound to a non-analog input");
        return None;
    }
    let pin = input.pin()?;
    match profile_for_lever(pin, &lever.lever, &params) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!(element_id = %lever.element_id, transport = %device.transport, error = %e, "invalid BLDC profile");
            None
        }
    }
}

#[async_trait]
impl InputSink for Bridge {
    async fn on_input(&self, transport: &str, pin: u8, value: i16) {
        let index = self.registry.index();
        let Some((input_id, kind)) = index.lookup(transport, pin) else {
            trace!(transport, pin, value, "reading on unconfigured pin");
            return;
        };
        match kind {
            InputKind::Button => match self.buttons.handle_event(input_id, value != 0) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => trace!(input = input_id, "button not bound"),
                Err(e) => warn!(input = input_id, error = %e, "button event dropped"),
            },
            InputKind::Analog => {
                if let Some(session) = self.calibrations.lock().get_mut(input_id) {
                    session.add_sample(i32::from(value));
                }
                let levers = Arc::clone(&self.levers.read());
                match levers.get(input_id) {
                    Some(lever) => lever.update(i32::from(value)),
                    None => trace!(input = input_id, "analog input not bound"),
                }
            }
        }
    }
}
