//! Wire protocol for TSW IO controller boards
//!
//! The bridge talks to its microcontroller firmware with small fixed-layout
//! binary messages. Every message starts with a one byte type tag followed by a
//! body whose length is fully determined by the tag (and, for variable
//! messages, by the counts carried in the body).
//!
//! ## Features
//! - Identity handshake (request id, firmware version, stored config id)
//! - Multi-part input configuration upload (analog, button, key matrix)
//! - Input value and heartbeat reports
//! - Digital outputs
//! - BLDC haptic lever profiles
//!
//! Decoding only ever works on a complete, exact-length buffer. Framing and
//! reassembly belong to the transport.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod frame;
pub mod message;
pub mod types;

pub use frame::*;
pub use message::*;
pub use types::*;

pub use tswio_errors::ProtocolError;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

pub const TAG_IDENTITY_REQUEST: u8 = 0x00;
pub const TAG_IDENTITY_RESPONSE: u8 = 0x01;
pub const TAG_CONFIGURE: u8 = 0x02;
pub const TAG_CONFIGURATION_STORED: u8 = 0x03;
pub const TAG_CONFIGURATION_ERROR: u8 = 0x04;
pub const TAG_INPUT_VALUE: u8 = 0x05;
pub const TAG_HEARTBEAT: u8 = 0x06;
pub const TAG_SET_OUTPUT: u8 = 0x07;
pub const TAG_LOAD_BLDC_PROFILE: u8 = 0x0B;
pub const TAG_DEACTIVATE_BLDC_PROFILE: u8 = 0x0C;

/// Shared header of every `Configure` part: config_id(4) + total_parts(1) + part_number(1).
pub const CONFIGURE_HEADER_SIZE: usize = 6;
pub const DETENT_SIZE: usize = 5;
pub const DAMPING_RANGE_SIZE: usize = 3;

pub const MAX_DETENT_POSITION: u8 = 100;
pub const MAX_ANALOG_SENSITIVITY: u8 = 10;
pub const MAX_LIST_ENTRIES: usize = 255;

/// Firmware reports matrix keys on virtual pins starting here.
pub const VIRTUAL_PIN_BASE: u8 = 128;
