//! TSW IO bridge service
//!
//! Connects control boards to the simulator: devices report pin readings,
//! the bridge maps them through the active train's levers and button
//! bindings, and simulator state flows back to the boards' outputs.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod bridge;
pub mod config;
pub mod connection;
pub mod levers;
pub mod observability;
pub mod outputs;
pub mod registry;
pub mod repository;
pub mod train;

pub use bridge::{Activation, Bridge};
pub use config::{BridgeConfig, DeviceConfig, SCHEMA_VERSION};
pub use connection::{ConnectionError, HeartbeatMonitor, InputSink, handshake, receive_loop, upload_configuration};
pub use observability::{LoggingConfig, init_logging};
pub use outputs::{Comparison, OutputBinding, OutputMonitor};
pub use registry::DeviceRegistry;
pub use repository::{
    DeviceRecord, InMemoryRepository, InputRecord, Layout, LeverElement, Repository, TrainLayout,
    TrainRecord,
};
pub use train::{TrainChange, TrainWatcher};
