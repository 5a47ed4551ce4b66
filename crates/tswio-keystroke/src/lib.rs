//! Keyboard output for buttons bound in keystroke mode.
//!
//! A [`KeyCombo`] such as `CTRL+SHIFT+F1` is parsed and validated once when
//! the binding is loaded. The button controller then drives a
//! [`KeystrokeSink`]; the stock sink shells out to a small helper program so
//! the daemon itself never needs access to the input stack.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod combo;
pub mod sink;

pub use combo::{Key, KeyCombo, Modifier};
pub use sink::{DisabledKeystrokeSink, KeyAction, KeystrokeSink, ProcessKeystrokeSink};

pub use tswio_errors::KeystrokeError;

pub type KeystrokeResult<T> = Result<T, KeystrokeError>;
