//! Notch definitions

use serde::{Deserialize, Serialize};
use tswio_errors::ValidationError;

/// A closed sub-range of `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
}

impl InputRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    fn check(&self, field: &str, strict: bool) -> Result<(), ValidationError> {
        for bound in [self.min, self.max] {
            if !(0.0..=1.0).contains(&bound) {
                return Err(ValidationError::out_of_range(field, bound, 0.0, 1.0));
            }
        }
        let ordered = if strict {
            self.min < self.max
        } else {
            self.min <= self.max
        };
        if !ordered {
            return Err(ValidationError::constraint(format!(
                "{field}: min {} must be below max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// What a notch does with its slice of travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotchKind {
    /// Detent with a constant simulator output.
    Gate { value: f64 },
    /// Continuous sub-range of the simulator output.
    Linear { min_value: f64, max_value: f64 },
}

impl NotchKind {
    pub fn is_gate(&self) -> bool {
        matches!(self, NotchKind::Gate { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notch {
    /// Unique within its lever; defines order.
    pub index: u32,
    #[serde(flatten)]
    pub kind: NotchKind,
    /// Slice of the physical lever's normalized travel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputRange>,
    /// Slice of the simulator control's input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sim_input: Option<InputRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Notch {
    pub fn gate(index: u32, value: f64) -> Self {
        Self {
            index,
            kind: NotchKind::Gate { value },
            input: None,
            sim_input: None,
            description: None,
        }
    }

    pub fn linear(index: u32, min_value: f64, max_value: f64) -> Self {
        Self {
            index,
            kind: NotchKind::Linear {
                min_value,
                max_value,
            },
            input: None,
            sim_input: None,
            description: None,
        }
    }

    pub fn with_input(mut self, min: f64, max: f64) -> Self {
        self.input = Some(InputRange::new(min, max));
        self
    }

    pub fn with_sim_input(mut self, min: f64, max: f64) -> Self {
        self.sim_input = Some(InputRange::new(min, max));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.kind {
            NotchKind::Gate { value } if !value.is_finite() => {
                return Err(ValidationError::invalid_format("gate", "value must be finite"));
            }
            NotchKind::Linear {
                min_value,
                max_value,
            } if !(min_value.is_finite() && max_value.is_finite()) => {
                return Err(ValidationError::invalid_format(
                    "linear",
                    "min_value and max_value must be finite",
                ));
            }
            _ => {}
        }
        if let Some(input) = &self.input {
            input.check("input", true)?;
        }
        if let Some(sim) = &self.sim_input {
            sim.check("sim_input", false)?;
        }
        Ok(())
    }

    /// Whether `value` falls in this notch's hardware range.
    ///
    /// Ranges are half-open; only a range ending at 1.0 also contains 1.0.
    pub fn contains(&self, value: f64) -> bool {
        match &self.input {
            Some(range) => {
                (range.min <= value && value < range.max) || (value >= 1.0 && range.max >= 1.0)
            }
            None => false,
        }
    }
}
