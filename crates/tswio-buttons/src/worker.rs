//! Per-button worker task.
//!
//! A worker owns all mutable state of one bound input. Presses, releases and
//! its own timer wake-ups arrive through one mailbox and are handled in
//! order, so a button's commands never reorder. The last value sent is
//! tracked per element and shared by every worker of one load, so two
//! inputs bound to the same element dedupe against each other.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, trace, warn};
use tswio_keystroke::{KeyCombo, KeystrokeSink};
use tswio_simulator::SimulatorClient;

use crate::{HardwareType, InputId, Sequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    On,
    Off,
}

#[derive(Debug)]
pub(crate) enum Command {
    Press,
    Release,
    Repeat { generation: u64 },
    Step { generation: u64, side: Side, index: usize },
}

/// A binding with its sequence references looked up.
#[derive(Debug)]
pub(crate) enum ResolvedAction {
    Simple {
        endpoint: String,
        on_value: f64,
        off_value: f64,
    },
    Momentary {
        endpoint: String,
        on_value: f64,
        off_value: f64,
        repeat: Duration,
    },
    Sequence {
        hardware: HardwareType,
        on: Arc<Sequence>,
        off: Option<Arc<Sequence>>,
    },
    Keystroke {
        combo: KeyCombo,
    },
}

/// Last value successfully sent, by element id.
pub(crate) type LastSent = Arc<Mutex<HashMap<String, f64>>>;

pub(crate) struct Outputs {
    pub simulator: Arc<dyn SimulatorClient>,
    pub keystrokes: Arc<dyn KeystrokeSink>,
}

pub(crate) struct Worker {
    element_id: String,
    input_id: InputId,
    action: Arc<ResolvedAction>,
    outputs: Arc<Outputs>,
    epoch: Arc<AtomicU64>,
    spawned_in: u64,
    mailbox: mpsc::WeakUnboundedSender<Command>,
    generation: u64,
    last_sent: LastSent,
}

/// Start a worker and return its mailbox. The worker exits once every
/// strong sender is gone or the controller epoch moves on.
pub(crate) fn spawn(
    element_id: String,
    input_id: InputId,
    action: ResolvedAction,
    outputs: Arc<Outputs>,
    last_sent: LastSent,
    epoch: Arc<AtomicU64>,
) -> mpsc::UnboundedSender<Command> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned_in = epoch.load(Ordering::Acquire);
    let worker = Worker {
        element_id,
        input_id,
        action: Arc::new(action),
        outputs,
        epoch,
        spawned_in,
        mailbox: tx.downgrade(),
        generation: 0,
        last_sent,
    };
    tokio::spawn(worker.run(rx));
    tx
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            if self.epoch.load(Ordering::Acquire) != self.spawned_in {
                break;
            }
            self.handle(command).await;
        }
        debug!(input = %self.input_id, element_id = %self.element_id, "button worker stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Press => self.on_press().await,
            Command::Release => self.on_release().await,
            Command::Repeat { generation } if generation == self.generation => {
                self.on_repeat().await;
            }
            Command::Step {
                generation,
                side,
                index,
            } if generation == self.generation => self.run_step(side, index).await,
            stale => trace!(input = %self.input_id, ?stale, "dropping stale wake-up"),
        }
    }

    /// Invalidate every pending timer and step.
    fn cancel(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    async fn on_press(&mut self) {
        let generation = self.cancel();
        let action = Arc::clone(&self.action);
        match action.as_ref() {
            ResolvedAction::Simple {
                endpoint, on_value, ..
            } => self.send_changed(endpoint, *on_value).await,
            ResolvedAction::Momentary {
                endpoint,
                on_value,
                repeat,
                ..
            } => {
                self.send(endpoint, *on_value).await;
                self.schedule(*repeat, Command::Repeat { generation });
            }
            ResolvedAction::Sequence { .. } => self.run_step(Side::On, 0).await,
            ResolvedAction::Keystroke { combo } => {
                if let Err(e) = self.outputs.keystrokes.key_down(combo).await {
                    warn!(element_id = %self.element_id, %combo, error = %e, "key down failed");
                }
            }
        }
    }

    async fn on_release(&mut self) {
        let action = Arc::clone(&self.action);
        match action.as_ref() {
            ResolvedAction::Simple {
                endpoint,
                off_value,
                ..
            } => {
                self.cancel();
                self.send_changed(endpoint, *off_value).await;
            }
            ResolvedAction::Momentary {
                endpoint,
                off_value,
                ..
            } => {
                self.cancel();
                self.send(endpoint, *off_value).await;
            }
            ResolvedAction::Sequence {
                hardware: HardwareType::Latching,
                off,
                ..
            } => {
                self.cancel();
                if off.is_some() {
                    self.run_step(Side::Off, 0).await;
                }
            }
            ResolvedAction::Sequence {
                hardware: HardwareType::Momentary,
                ..
            } => {
                trace!(input = %self.input_id, "release ignored for momentary sequence button");
            }
            ResolvedAction::Keystroke { combo } => {
                self.cancel();
                if let Err(e) = self.outputs.keystrokes.key_up(combo).await {
                    warn!(element_id = %self.element_id, %combo, error = %e, "key up failed");
                }
            }
        }
    }

    async fn on_repeat(&mut self) {
        let action = Arc::clone(&self.action);
        if let ResolvedAction::Momentary {
            endpoint,
            on_value,
            repeat,
            ..
        } = action.as_ref()
        {
            self.send(endpoint, *on_value).await;
            self.schedule(
                *repeat,
                Command::Repeat {
                    generation: self.generation,
                },
            );
        }
    }

    async fn run_step(&mut self, side: Side, index: usize) {
        let action = Arc::clone(&self.action);
        let ResolvedAction::Sequence { on, off, .. } = action.as_ref() else {
            return;
        };
        let sequence = match side {
            Side::On => on,
            Side::Off => match off {
                Some(off) => off,
                None => return,
            },
        };
        let Some(command) = sequence.command(index) else {
            return;
        };
        debug!(
            element_id = %self.element_id,
            sequence = sequence.id(),
            position = command.position,
            "sequence step"
        );
        self.send(&command.endpoint, command.value).await;

        let next = index.saturating_add(1);
        if next < sequence.commands().len() {
            self.schedule(
                command.delay(),
                Command::Step {
                    generation: self.generation,
                    side,
                    index: next,
                },
            );
        }
    }

    fn schedule(&self, delay: Duration, command: Command) {
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            let Some(tx) = mailbox.upgrade() else {
                return;
            };
            if tx.send(command).is_err() {
                trace!("button worker gone before wake-up");
            }
        });
    }

    async fn send(&mut self, endpoint: &str, value: f64) {
        match self.outputs.simulator.set(endpoint, value).await {
            Ok(()) => {
                self.last_sent.lock().insert(self.element_id.clone(), value);
            }
            Err(e) => {
                warn!(element_id = %self.element_id, endpoint, value, error = %e, "button send failed");
            }
        }
    }

    /// Skip the write when it repeats the last value sent for this element.
    async fn send_changed(&mut self, endpoint: &str, value: f64) {
        let unchanged = self
            .last_sent
            .lock()
            .get(&self.element_id)
            .is_some_and(|last| (last - value).abs() < f64::EPSILON);
        if unchanged {
            trace!(element_id = %self.element_id, value, "unchanged, not sending");
            return;
        }
        self.send(endpoint, value).await;
    }
}
