//! Lever runtime: raw analog readings to simulator input values

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace, warn};
use tswio_calibration::{Calibration, DEFAULT_MAX_HARDWARE_VALUE};
use tswio_errors::MappingError;
use tswio_lever::{LeverConfig, map_input};
use tswio_simulator::SimulatorClient;

/// Calibration used for inputs that were never calibrated: the full raw
/// range, not inverted.
pub fn uncalibrated() -> Calibration {
    Calibration {
        min: 0,
        max: DEFAULT_MAX_HARDWARE_VALUE,
        max_hardware_value: DEFAULT_MAX_HARDWARE_VALUE,
        inverted: false,
        rollover: false,
    }
}

/// Mapping state of one lever, independent of any task.
#[derive(Debug, Clone)]
pub struct LeverState {
    element_id: String,
    config: LeverConfig,
    calibration: Calibration,
    last_sent: Option<f64>,
    last_error: Option<MappingError>,
}

impl LeverState {
    pub fn new(element_id: impl Into<String>, config: LeverConfig, calibration: Calibration) -> Self {
        Self {
            element_id: element_id.into(),
            config,
            calibration,
            last_sent: None,
            last_error: None,
        }
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoints.value
    }

    /// Value to send for a raw reading, or `None` when nothing should be
    /// sent: the mapped value did not change, or the reading maps to no
    /// notch. A mapping error is logged the first time it occurs.
    pub fn next_value(&mut self, raw: i32) -> Option<f64> {
        let position = self.calibration.normalized(raw);
        match map_input(&self.config, position) {
            Ok(value) => {
                if self.last_error.take().is_some() {
                    debug!(element_id = %self.element_id, "lever mapping recovered");
                }
                if self
                    .last_sent
                    .is_some_and(|last| (last - value).abs() < f64::EPSILON)
                {
                    return None;
                }
                Some(value)
            }
            Err(e) => {
                if self.last_error.as_ref() != Some(&e) {
                    warn!(element_id = %self.element_id, position, error = %e, "lever position not mapped");
                    self.last_error = Some(e);
                }
                None
            }
        }
    }

    /// Record a successful send.
    pub fn sent(&mut self, value: f64) {
        self.last_sent = Some(value);
    }
}

/// Handle to a running lever task. Dropping it stops the task.
#[derive(Debug)]
pub struct LeverHandle {
    readings: watch::Sender<Option<i32>>,
}

impl LeverHandle {
    /// Publish the latest raw reading. Readings that arrive faster than the
    /// simulator accepts them are coalesced to the newest one.
    pub fn update(&self, raw: i32) {
        self.readings.send_replace(Some(raw));
    }
}

/// Start the task that drives one lever.
///
/// Must be called from within a tokio runtime.
pub fn spawn(mut state: LeverState, simulator: Arc<dyn SimulatorClient>) -> LeverHandle {
    let (tx, mut rx) = watch::channel(None::<i32>);
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let Some(raw) = *rx.borrow_and_update() else {
                continue;
            };
            let Some(value) = state.next_value(raw) else {
                continue;
            };
            match simulator.set(state.endpoint(), value).await {
                Ok(()) => {
                    trace!(element_id = %state.element_id(), raw, value, "lever sent");
                    state.sent(value);
                }
                Err(e) => {
                    warn!(element_id = %state.element_id(), error = %e, "lever send failed");
                }
            }
        }
        debug!(element_id = %state.element_id(), "lever task stopped");
    });
    LeverHandle { readings: tx }
}
