//! The button controller.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tswio_errors::ControllerError;
use tswio_keystroke::KeystrokeSink;
use tswio_simulator::SimulatorClient;

use crate::worker::{self, Command, LastSent, Outputs, ResolvedAction};
use crate::{
    Binding, BindingAction, BindingDefaults, ButtonInputBinding, InputId, InputIndex, InputKind,
    Sequence,
};

struct WorkerHandle {
    element_id: String,
    mailbox: mpsc::UnboundedSender<Command>,
}

/// Routes button transitions to per-input workers.
///
/// Both lookup tables are immutable snapshots behind a lock that is only
/// held long enough to clone or replace the `Arc`.
pub struct ButtonController {
    outputs: Arc<Outputs>,
    index: RwLock<Arc<InputIndex>>,
    workers: RwLock<Arc<HashMap<InputId, WorkerHandle>>>,
    epoch: Arc<AtomicU64>,
}

impl ButtonController {
    pub fn new(simulator: Arc<dyn SimulatorClient>, keystrokes: Arc<dyn KeystrokeSink>) -> Self {
        Self {
            outputs: Arc::new(Outputs {
                simulator,
                keystrokes,
            }),
            index: RwLock::new(Arc::new(InputIndex::default())),
            workers: RwLock::new(Arc::new(HashMap::new())),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the `(transport, pin)` index after a device change.
    pub fn set_input_index(&self, index: Arc<InputIndex>) {
        debug!(inputs = index.len(), "input index rebuilt");
        *self.index.write() = index;
    }

    pub fn input_index(&self) -> Arc<InputIndex> {
        Arc::clone(&self.index.read())
    }

    /// Validate stored records and load the enabled ones. Invalid records
    /// are logged and skipped.
    pub fn load_records(
        &self,
        records: &[ButtonInputBinding],
        sequences: &[Sequence],
        defaults: &BindingDefaults,
    ) -> usize {
        let bindings: Vec<Binding> = records
            .iter()
            .filter(|r| r.enabled)
            .filter_map(|r| match Binding::from_record(r, defaults) {
                Ok(binding) => Some(binding),
                Err(e) => {
                    warn!(element_id = %r.element_id, input = %r.input_id, error = %e, "skipping invalid binding");
                    None
                }
            })
            .collect();
        self.load(bindings, sequences)
    }

    /// Replace every binding. Pending timers and sequences of the previous
    /// set are invalidated first, and all "last sent" state starts fresh.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load(&self, bindings: Vec<Binding>, sequences: &[Sequence]) -> usize {
        self.epoch.fetch_add(1, Ordering::AcqRel);

        let by_id: HashMap<&str, Arc<Sequence>> = sequences
            .iter()
            .map(|s| (s.id(), Arc::new(s.clone())))
            .collect();

        let last_sent = LastSent::default();
        let mut workers = HashMap::with_capacity(bindings.len());
        for binding in bindings {
            if workers.contains_key(&binding.input_id) {
                warn!(input = %binding.input_id, element_id = %binding.element_id, "input already bound, ignoring");
                continue;
            }
            let action = match resolve(&binding, &by_id) {
                Ok(action) => action,
                Err(e) => {
                    warn!(element_id = %binding.element_id, error = %e, "skipping binding");
                    continue;
                }
            };
            let mailbox = worker::spawn(
                binding.element_id.clone(),
                binding.input_id.clone(),
                action,
                Arc::clone(&self.outputs),
                Arc::clone(&last_sent),
                Arc::clone(&self.epoch),
            );
            workers.insert(
                binding.input_id,
                WorkerHandle {
                    element_id: binding.element_id,
                    mailbox,
                },
            );
        }

        let count = workers.len();
        *self.workers.write() = Arc::new(workers);
        info!(bindings = count, "button bindings loaded");
        count
    }

    /// Drop every binding, e.g. when the active train goes away.
    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        *self.workers.write() = Arc::new(HashMap::new());
        debug!("button bindings cleared");
    }

    pub fn binding_count(&self) -> usize {
        self.workers.read().len()
    }

    pub fn is_bound(&self, input_id: &str) -> bool {
        self.workers.read().contains_key(input_id)
    }

    /// Handle a raw reading from a device: non-zero is pressed.
    pub fn handle_input(&self, transport: &str, pin: u8, value: i16) -> Result<(), ControllerError> {
        let index = self.input_index();
        let Some((input_id, kind)) = index.lookup(transport, pin) else {
            return Err(ControllerError::DeviceNotFound(format!("{transport} pin {pin}")));
        };
        if kind != InputKind::Button {
            return Err(ControllerError::BindingNotFound(input_id.to_string()));
        }
        self.handle_event(input_id, value != 0)
    }

    pub fn handle_event(&self, input_id: &str, pressed: bool) -> Result<(), ControllerError> {
        let workers = Arc::clone(&self.workers.read());
        let Some(handle) = workers.get(input_id) else {
            return Err(ControllerError::BindingNotFound(input_id.to_string()));
        };
        let command = if pressed {
            Command::Press
        } else {
            Command::Release
        };
        debug!(input = input_id, element_id = %handle.element_id, pressed, "button event");
        handle
            .mailbox
            .send(command)
            .ok()
            .ok_or_else(|| ControllerError::WorkerStopped(input_id.to_string()))
    }

    pub fn press(&self, input_id: &str) -> Result<(), ControllerError> {
        self.handle_event(input_id, true)
    }

    pub fn release(&self, input_id: &str) -> Result<(), ControllerError> {
        self.handle_event(input_id, false)
    }
}

impl Drop for ButtonController {
    fn drop(&mut self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }
}

fn resolve(
    binding: &Binding,
    sequences: &HashMap<&str, Arc<Sequence>>,
) -> Result<ResolvedAction, ControllerError> {
    let lookup = |id: &str| {
        sequences
            .get(id)
            .cloned()
            .ok_or_else(|| ControllerError::SequenceNotFound(id.to_string()))
    };
    Ok(match &binding.action {
        BindingAction::Simple {
            endpoint,
            on_value,
            off_value,
        } => ResolvedAction::Simple {
            endpoint: endpoint.clone(),
            on_value: *on_value,
            off_value: *off_value,
        },
        BindingAction::Momentary {
            endpoint,
            on_value,
            off_value,
            repeat,
        } => ResolvedAction::Momentary {
            endpoint: endpoint.clone(),
            on_value: *on_value,
            off_value: *off_value,
            repeat: *repeat,
        },
        BindingAction::Sequence {
            hardware,
            on_sequence_id,
            off_sequence_id,
        } => {
            let on = lookup(on_sequence_id)?;
            let off = match off_sequence_id {
                Some(id) => match lookup(id) {
                    Ok(seq) => Some(seq),
                    Err(e) => {
                        warn!(element_id = %binding.element_id, error = %e, "off sequence missing, release will only cancel");
                        None
                    }
                },
                None => None,
            };
            ResolvedAction::Sequence {
                hardware: *hardware,
                on,
                off,
            }
        }
        BindingAction::Keystroke { combo } => ResolvedAction::Keystroke {
            combo: combo.clone(),
        },
    })
}
