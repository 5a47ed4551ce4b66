//! Button bindings and controller
//!
//! A button input is bound to one of four behaviours:
//!
//! - **simple**: press sends `on_value`, release sends `off_value`
//! - **momentary**: like simple, but `on_value` repeats while held
//! - **sequence**: press runs a timed list of simulator commands
//! - **keystroke**: press and release become key down and key up
//!
//! Records are validated into [`Binding`]s once, when they are loaded. The
//! [`ButtonController`] runs one worker task per bound input; every timer
//! and sequence step carries the generation it was started under and is
//! dropped if that generation is no longer current when it fires.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod binding;
pub mod controller;
pub mod index;
pub mod sequence;
mod worker;

pub use binding::{
    Binding, BindingAction, BindingDefaults, ButtonInputBinding, ButtonMode, HardwareType,
    MAX_REPEAT_INTERVAL_MS,
};
pub use controller::ButtonController;
pub use index::{InputIndex, InputKind, RegisteredInput, matrix_key_id};
pub use sequence::{Sequence, SequenceCommand};

pub use tswio_errors::{ControllerError, ValidationError};

pub type ElementId = String;
pub type InputId = String;
