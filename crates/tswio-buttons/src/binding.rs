//! Button binding records and their validated form.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tswio_errors::ValidationError;
use tswio_keystroke::KeyCombo;

use crate::{ElementId, InputId};

pub const MAX_REPEAT_INTERVAL_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonMode {
    #[default]
    Simple,
    Momentary,
    Sequence,
    Keystroke,
}

/// What the physical switch does when let go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareType {
    /// Springs back on release
    #[default]
    Momentary,
    /// Stays put until toggled again
    Latching,
}

fn default_on_value() -> f64 {
    1.0
}

fn default_enabled() -> bool {
    true
}

/// A binding as stored by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonInputBinding {
    pub element_id: ElementId,
    pub input_id: InputId,
    #[serde(default)]
    pub mode: ButtonMode,
    #[serde(default)]
    pub hardware_type: HardwareType,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_on_value")]
    pub on_value: f64,
    #[serde(default)]
    pub off_value: f64,
    #[serde(default)]
    pub repeat_interval_ms: Option<u64>,
    #[serde(default)]
    pub keystroke: Option<String>,
    #[serde(default)]
    pub on_sequence_id: Option<String>,
    #[serde(default)]
    pub off_sequence_id: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ButtonInputBinding {
    pub fn new(element_id: impl Into<String>, input_id: impl Into<String>, mode: ButtonMode) -> Self {
        Self {
            element_id: element_id.into(),
            input_id: input_id.into(),
            mode,
            hardware_type: HardwareType::Momentary,
            endpoint: None,
            on_value: default_on_value(),
            off_value: 0.0,
            repeat_interval_ms: None,
            keystroke: None,
            on_sequence_id: None,
            off_sequence_id: None,
            enabled: true,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_values(mut self, on_value: f64, off_value: f64) -> Self {
        self.on_value = on_value;
        self.off_value = off_value;
        self
    }

    pub fn with_hardware(mut self, hardware_type: HardwareType) -> Self {
        self.hardware_type = hardware_type;
        self
    }

    pub fn with_repeat_interval_ms(mut self, ms: u64) -> Self {
        self.repeat_interval_ms = Some(ms);
        self
    }

    pub fn with_keystroke(mut self, combo: impl Into<String>) -> Self {
        self.keystroke = Some(combo.into());
        self
    }

    pub fn with_sequences(mut self, on: impl Into<String>, off: Option<String>) -> Self {
        self.on_sequence_id = Some(on.into());
        self.off_sequence_id = off;
        self
    }
}

/// Values applied when a record leaves a field unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingDefaults {
    pub repeat_interval_ms: u64,
}

impl Default for BindingDefaults {
    fn default() -> Self {
        Self {
            repeat_interval_ms: 100,
        }
    }
}

/// Mode-specific behaviour of a validated binding.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingAction {
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
        on_sequence_id: String,
        off_sequence_id: Option<String>,
    },
    Keystroke {
        combo: KeyCombo,
    },
}

/// A binding whose fields satisfy its mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub element_id: ElementId,
    pub input_id: InputId,
    pub action: BindingAction,
}

fn non_empty(field: &str, value: Option<&String>) -> Result<String, ValidationError> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::required(field)),
    }
}

impl Binding {
    pub fn from_record(
        record: &ButtonInputBinding,
        defaults: &BindingDefaults,
    ) -> Result<Self, ValidationError> {
        let repeat_ms = record
            .repeat_interval_ms
            .unwrap_or(defaults.repeat_interval_ms);
        if repeat_ms == 0 || repeat_ms > MAX_REPEAT_INTERVAL_MS {
            return Err(ValidationError::out_of_range(
                "repeat_interval_ms",
                repeat_ms,
                1,
                MAX_REPEAT_INTERVAL_MS,
            ));
        }
        if !(record.on_value.is_finite() && record.off_value.is_finite()) {
            return Err(ValidationError::invalid_format(
                "on_value",
                "on_value and off_value must be finite",
            ));
        }
        let latching_sequence =
            record.mode == ButtonMode::Sequence && record.hardware_type == HardwareType::Latching;
        if record.off_sequence_id.is_some() && !latching_sequence {
            return Err(ValidationError::not_allowed(
                "off_sequence_id",
                "only sequence bindings on latching hardware have an off sequence",
            ));
        }

        let action = match record.mode {
            ButtonMode::Simple => BindingAction::Simple {
                endpoint: non_empty("endpoint", record.endpoint.as_ref())?,
                on_value: record.on_value,
                off_value: record.off_value,
            },
            ButtonMode::Momentary => BindingAction::Momentary {
                endpoint: non_empty("endpoint", record.endpoint.as_ref())?,
                on_value: record.on_value,
                off_value: record.off_value,
                repeat: Duration::from_millis(repeat_ms),
            },
            ButtonMode::Sequence => BindingAction::Sequence {
                hardware: record.hardware_type,
                on_sequence_id: non_empty("on_sequence_id", record.on_sequence_id.as_ref())?,
                off_sequence_id: record.off_sequence_id.clone(),
            },
            ButtonMode::Keystroke => {
                let text = non_empty("keystroke", record.keystroke.as_ref())?;
                let combo = KeyCombo::parse(&text)
                    .map_err(|e| ValidationError::invalid_format("keystroke", e.to_string()))?;
                BindingAction::Keystroke { combo }
            }
        };

        Ok(Self {
            element_id: record.element_id.clone(),
            input_id: record.input_id.clone(),
            action,
        })
    }

    pub fn mode(&self) -> ButtonMode {
        match self.action {
            BindingAction::Simple { .. } => ButtonMode::Simple,
            BindingAction::Momentary { .. } => ButtonMode::Momentary,
            BindingAction::Sequence { .. } => ButtonMode::Sequence,
            BindingAction::Keystroke { .. } => ButtonMode::Keystroke,
        }
    }
}

impl TryFrom<&ButtonInputBinding> for Binding {
    type Error = ValidationError;

    fn try_from(record: &ButtonInputBinding) -> Result<Self, Self::Error> {
        Self::from_record(record, &BindingDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(mode: ButtonMode) -> ButtonInputBinding {
        ButtonInputBinding::new("horn", "panel/4", mode)
    }

    #[test]
    fn test_simple_requires_endpoint() {
        let err = Binding::try_from(&record(ButtonMode::Simple));
        assert_eq!(err, Err(ValidationError::required("endpoint")));

        let ok = Binding::try_from(&record(ButtonMode::Simple).with_endpoint("Horn.InputValue"));
        assert_eq!(ok.map(|b| b.mode()), Ok(ButtonMode::Simple));
    }

    #[test]
    fn test_repeat_interval_bounds() {
        let base = record(ButtonMode::Momentary).with_endpoint("Horn.InputValue");
        for ms in [0, 5001] {
            assert!(Binding::try_from(&base.clone().with_repeat_interval_ms(ms)).is_err());
        }
        for ms in [1, 5000] {
            assert!(Binding::try_from(&base.clone().with_repeat_interval_ms(ms)).is_ok());
        }
    }

    #[test]
    fn test_off_sequence_only_for_latching_sequence() {
        let momentary = record(ButtonMode::Sequence).with_sequences("start", Some("stop".into()));
        assert!(matches!(
            Binding::try_from(&momentary),
            Err(ValidationError::NotAllowed { .. })
        ));

        let latching = momentary.with_hardware(HardwareType::Latching);
        assert!(Binding::try_from(&latching).is_ok());
    }

    #[test]
    fn test_keystroke_is_parsed_once() {
        let bad = record(ButtonMode::Keystroke).with_keystroke("CTRL+");
        assert!(matches!(
            Binding::try_from(&bad),
            Err(ValidationError::InvalidFormat { .. })
        ));

        let good = record(ButtonMode::Keystroke).with_keystroke("ctrl+s");
        match Binding::try_from(&good).map(|b| b.action) {
            Ok(BindingAction::Keystroke { combo }) => assert_eq!(combo.to_string(), "CTRL+S"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_record_defaults_from_json() -> Result<(), serde_json::Error> {
        let record: ButtonInputBinding = serde_json::from_str(
            r#"{"element_id":"sander","input_id":"panel/7","endpoint":"Sander.InputValue"}"#,
        )?;
        assert_eq!(record.mode, ButtonMode::Simple);
        assert_eq!(record.hardware_type, HardwareType::Momentary);
        assert!(record.enabled);
        assert!((record.on_value - 1.0).abs() < f64::EPSILON);
        Ok(())
    }
}
