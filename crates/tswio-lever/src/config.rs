//! Lever configuration

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tswio_errors::ValidationError;

use crate::Notch;

/// Simulator endpoint paths for one lever control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverEndpoints {
    pub value: String,
    pub min: String,
    pub max: String,
    pub notch_count: String,
    pub notch_index: String,
    pub output: String,
}

impl LeverEndpoints {
    /// Standard endpoints of a control node such as
    /// `CurrentDrivableActor/Throttle(Lever)`.
    pub fn for_control(control_path: &str) -> Self {
        let base = control_path.trim_end_matches('/');
        Self {
            value: format!("{base}.InputValue"),
            min: format!("{base}.Function.GetMinimumInputValue"),
            max: format!("{base}.Function.GetMaximumInputValue"),
            notch_count: format!("{base}.Function.GetNotchCount"),
            notch_index: format!("{base}.Function.GetCurrentNotchIndex"),
            output: format!("{base}.Function.GetCurrentOutputValue"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeverType {
    #[default]
    Discrete,
    Continuous,
    Hybrid,
}

impl std::fmt::Display for LeverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LeverType::Discrete => "discrete",
            LeverType::Continuous => "continuous",
            LeverType::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Notch table and endpoints of one lever element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverConfig {
    pub endpoints: LeverEndpoints,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub lever_type: LeverType,
    #[serde(default)]
    notches: Vec<Notch>,
}

impl LeverConfig {
    pub fn new(
        endpoints: LeverEndpoints,
        lever_type: LeverType,
        notches: Vec<Notch>,
    ) -> Result<Self, ValidationError> {
        let mut config = Self {
            endpoints,
            inverted: false,
            lever_type,
            notches: Vec::new(),
        };
        config.replace_notches(notches)?;
        Ok(config)
    }

    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Notches ordered by index.
    pub fn notches(&self) -> &[Notch] {
        &self.notches
    }

    /// Replace the whole notch table. On error the current table is kept.
    pub fn replace_notches(&mut self, mut notches: Vec<Notch>) -> Result<(), ValidationError> {
        validate_notches(&notches)?;
        notches.sort_by_key(|n| n.index);
        self.notches = notches;
        Ok(())
    }

    /// Re-check invariants after deserialization and restore index order.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_notches(&self.notches)?;
        self.notches.sort_by_key(|n| n.index);
        Ok(())
    }
}

fn validate_notches(notches: &[Notch]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(notches.len());
    for notch in notches {
        notch.validate()?;
        if !seen.insert(notch.index) {
            return Err(ValidationError::not_unique("notch.index", notch.index));
        }
    }
    Ok(())
}
