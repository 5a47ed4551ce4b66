//! Command sequences.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tswio_errors::ValidationError;

/// One step of a sequence. `delay_ms` is the wait after this command before
/// the next one fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceCommand {
    pub position: u32,
    pub endpoint: String,
    pub value: f64,
    #[serde(default)]
    pub delay_ms: u64,
}

impl SequenceCommand {
    pub fn new(position: u32, endpoint: impl Into<String>, value: f64, delay_ms: u64) -> Self {
        Self {
            position,
            endpoint: endpoint.into(),
            value,
            delay_ms,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// An ordered list of simulator writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SequenceRecord", into = "SequenceRecord")]
pub struct Sequence {
    id: String,
    name: String,
    commands: Vec<SequenceCommand>,
}

/// Serialized shape of a [`Sequence`].
#[derive(Serialize, Deserialize)]
pub struct SequenceRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    commands: Vec<SequenceCommand>,
}

impl Sequence {
    /// Commands are put in position order; positions must be unique.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mut commands: Vec<SequenceCommand>,
    ) -> Result<Self, ValidationError> {
        let mut seen = HashSet::new();
        for command in &commands {
            if !seen.insert(command.position) {
                return Err(ValidationError::not_unique("position", command.position));
            }
            if command.endpoint.trim().is_empty() {
                return Err(ValidationError::required("endpoint"));
            }
            if !command.value.is_finite() {
                return Err(ValidationError::invalid_format("value", "must be finite"));
            }
        }
        commands.sort_by_key(|c| c.position);
        Ok(Self {
            id: id.into(),
            name: name.into(),
            commands,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[SequenceCommand] {
        &self.commands
    }

    pub fn command(&self, index: usize) -> Option<&SequenceCommand> {
        self.commands.get(index)
    }

    /// Offset of each command from the start of the run.
    pub fn schedule(&self) -> Vec<Duration> {
        let mut at = Duration::ZERO;
        self.commands
            .iter()
            .map(|c| {
                let fire = at;
                at = at.saturating_add(c.delay());
                fire
            })
            .collect()
    }
}

impl TryFrom<SequenceRecord> for Sequence {
    type Error = ValidationError;

    fn try_from(record: SequenceRecord) -> Result<Self, Self::Error> {
        Sequence::new(record.id, record.name, record.commands)
    }
}

impl From<Sequence> for SequenceRecord {
    fn from(sequence: Sequence) -> Self {
        Self {
            id: sequence.id,
            name: sequence.name,
            commands: sequence.commands,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_sorted_by_position() -> Result<(), ValidationError> {
        let seq = Sequence::new(
            "start",
            "Start up",
            vec![
                SequenceCommand::new(2, "B.InputValue", 1.0, 0),
                SequenceCommand::new(1, "A.InputValue", 1.0, 500),
            ],
        )?;
        let order: Vec<u32> = seq.commands().iter().map(|c| c.position).collect();
        assert_eq!(order, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let result = Sequence::new(
            "s",
            "",
            vec![
                SequenceCommand::new(1, "A", 1.0, 0),
                SequenceCommand::new(1, "B", 1.0, 0),
            ],
        );
        assert_eq!(result, Err(ValidationError::not_unique("position", 1)));
    }

    #[test]
    fn test_schedule_offsets() -> Result<(), ValidationError> {
        let seq = Sequence::new(
            "s",
            "",
            vec![
                SequenceCommand::new(0, "A", 1.0, 500),
                SequenceCommand::new(1, "B", 1.0, 250),
                SequenceCommand::new(2, "C", 1.0, 0),
            ],
        )?;
        assert_eq!(
            seq.schedule(),
            vec![
                Duration::ZERO,
                Duration::from_millis(500),
                Duration::from_millis(750)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{"id":"s","commands":[{"position":0,"endpoint":"","value":1.0}]}"#;
        assert!(serde_json::from_str::<Sequence>(json).is_err());
    }
}
