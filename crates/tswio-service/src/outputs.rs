//! Output bindings: simulator values driving board outputs (lamps, LEDs)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use tswio_protocol::{Message, OutputLevel, SetOutput};
use tswio_simulator::SimulatorClient;

use crate::registry::DeviceRegistry;

/// Tolerance of the `eq`/`neq` comparisons.
pub const EQ_TOLERANCE: f64 = 1e-6;

/// How a simulator value is compared against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
}

impl Comparison {
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Gte => value >= threshold,
            Comparison::Lt => value < threshold,
            Comparison::Lte => value <= threshold,
            Comparison::Eq => (value - threshold).abs() < EQ_TOLERANCE,
            Comparison::Neq => (value - threshold).abs() >= EQ_TOLERANCE,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Drives `pin` on the board at `transport` high while the simulator value
/// at `endpoint` satisfies `operator threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBinding {
    pub id: String,
    pub transport: String,
    pub pin: u8,
    pub endpoint: String,
    pub operator: Comparison,
    pub threshold: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl OutputBinding {
    pub fn level_for(&self, value: f64) -> OutputLevel {
        if self.operator.holds(value, self.threshold) {
            OutputLevel::High
        } else {
            OutputLevel::Low
        }
    }
}

/// Polls output bindings and sends `SetOutput` when a level changes.
pub struct OutputMonitor {
    bindings: Vec<OutputBinding>,
    simulator: Arc<dyn SimulatorClient>,
    registry: Arc<DeviceRegistry>,
    levels: HashMap<String, OutputLevel>,
}

impl OutputMonitor {
    pub fn new(
        bindings: Vec<OutputBinding>,
        simulator: Arc<dyn SimulatorClient>,
        registry: Arc<DeviceRegistry>,
    ) -> Self {
        Self {
            bindings: bindings.into_iter().filter(|b| b.enabled).collect(),
            simulator,
            registry,
            levels: HashMap::new(),
        }
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Read every binding once. Returns the number of `SetOutput` messages
    /// sent.
    ///
    /// A level is only remembered once the board accepted it, so a failed
    /// send is retried on the next poll.
    pub async fn poll_once(&mut self) -> usize {
        let mut sent = 0;
        for binding in &self.bindings {
            let value = match self.simulator.get_f64(&binding.endpoint).await {
                Ok(value) => value,
                Err(e) => {
                    debug!(output = %binding.id, endpoint = %binding.endpoint, error = %e, "output read failed");
                    continue;
                }
            };
            let level = binding.level_for(value);
            if self.levels.get(&binding.id) == Some(&level) {
                continue;
            }
            let message = Message::SetOutput(SetOutput {
                pin: binding.pin,
                value: level,
            });
            match self.registry.send(&binding.transport, &message).await {
                Ok(()) => {
                    debug!(output = %binding.id, pin = binding.pin, ?level, "output changed");
                    self.levels.insert(binding.id.clone(), level);
                    sent += 1;
                }
                Err(e) => {
                    warn!(output = %binding.id, transport = %binding.transport, error = %e, "failed to set output");
                }
            }
        }
        sent
    }

    /// Poll forever at `period` on a background task.
    pub fn spawn(mut self, period: Duration) -> JoinHandle<()> {
        info!(bindings = self.bindings.len(), period_ms = period.as_millis(), "output monitor started");
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.poll_once().await;
            }
        })
    }
}
