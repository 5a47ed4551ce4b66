//! `(transport, pin) -> input` lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use tswio_protocol::InputConfig;

use crate::InputId;

/// How the bridge treats readings from an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Continuous reading fed to a lever
    Analog,
    /// On/off reading fed to the button controller
    Button,
}

/// An input configured on a connected device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredInput {
    pub id: InputId,
    pub config: InputConfig,
}

/// Id of one key of a matrix input.
pub fn matrix_key_id(matrix_id: &str, row: usize, col: usize) -> InputId {
    format!("{matrix_id}:r{row}c{col}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    id: InputId,
    kind: InputKind,
}

/// Immutable index rebuilt whenever the set of connected devices changes.
/// Matrix inputs are expanded into one button per key on its virtual pin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputIndex {
    by_transport: HashMap<String, HashMap<u8, Entry>>,
}

impl InputIndex {
    pub fn build<'a, I>(devices: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [RegisteredInput])>,
    {
        let mut by_transport: HashMap<String, HashMap<u8, Entry>> = HashMap::new();
        for (transport, inputs) in devices {
            let pins = by_transport.entry(transport.to_string()).or_default();
            for input in inputs {
                let entries: Vec<(u8, Entry)> = match &input.config {
                    InputConfig::Analog { pin, .. } => vec![(
                        *pin,
                        Entry {
                            id: input.id.clone(),
                            kind: InputKind::Analog,
                        },
                    )],
                    InputConfig::Button { pin, .. } => vec![(
                        *pin,
                        Entry {
                            id: input.id.clone(),
                            kind: InputKind::Button,
                        },
                    )],
                    matrix @ InputConfig::Matrix { .. } => matrix
                        .virtual_pins()
                        .into_iter()
                        .map(|key| {
                            (
                                key.pin,
                                Entry {
                                    id: matrix_key_id(&input.id, key.row, key.col),
                                    kind: InputKind::Button,
                                },
                            )
                        })
                        .collect(),
                };
                for (pin, entry) in entries {
                    if let Some(existing) = pins.get(&pin) {
                        warn!(
                            transport,
                            pin,
                            kept = %existing.id,
                            ignored = %entry.id,
                            "two inputs claim the same pin"
                        );
                        continue;
                    }
                    pins.insert(pin, entry);
                }
            }
        }
        Self { by_transport }
    }

    pub fn lookup(&self, transport: &str, pin: u8) -> Option<(&str, InputKind)> {
        self.by_transport
            .get(transport)
            .and_then(|pins| pins.get(&pin))
            .map(|e| (e.id.as_str(), e.kind))
    }

    pub fn len(&self) -> usize {
        self.by_transport.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
