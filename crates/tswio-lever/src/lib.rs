//! Lever notch model, analyzer and mapper
//!
//! A simulator lever is described by an ordered table of [`Notch`]es. Each
//! notch ties a slice of the physical lever's travel (hardware range) to a
//! slice of the simulator control's input (simulator range). Gates are
//! detents with a constant output; linear notches interpolate.
//!
//! The [`analyzer`] discovers that table by driving the live simulator, and
//! [`map_input`] applies it at runtime.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod analyzer;
pub mod bldc;
pub mod config;
pub mod mapper;
pub mod notch;
pub mod quick_check;
pub mod zones;

pub use analyzer::{AnalysisReport, AnalyzerConfig, LeverAnalyzer, NotchSuggestion};
pub use bldc::{BldcParams, profile_for_lever};
pub use config::{LeverConfig, LeverEndpoints, LeverType};
pub use mapper::{map_input, round2};
pub use notch::{InputRange, Notch, NotchKind};
pub use quick_check::{QuickCheck, quick_check};
pub use zones::{Sample, Zone, ZoneKind};

pub use tswio_errors::{CalibrationError, MappingError, ValidationError};
