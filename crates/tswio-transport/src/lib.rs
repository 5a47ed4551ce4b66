//! Device transports
//!
//! A [`DeviceTransport`] moves complete protocol frames to and from one
//! controller board. Reassembly of partial reads happens here so the codec in
//! `tswio-protocol` only ever sees exact-length buffers.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod tcp;
pub mod transport;

pub use tcp::{MAX_FRAME_LEN, TcpTransport, read_frame, write_frame};
pub use transport::{DeviceTransport, DeviceTransportExt};

pub use tswio_errors::TransportError;

pub type TransportResult<T> = Result<T, TransportError>;
