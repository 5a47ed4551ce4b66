//! Connected devices and the `(transport, pin)` index built from them

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};
use tswio_buttons::{InputIndex, RegisteredInput};
use tswio_errors::{TransportError, TswIoError};
use tswio_protocol::Message;
use tswio_transport::{DeviceTransport, DeviceTransportExt};

use crate::repository::DeviceRecord;

struct ConnectedDevice {
    transport: Arc<dyn DeviceTransport>,
    inputs: Vec<RegisteredInput>,
}

/// Devices currently attached to the bridge.
///
/// The device table and the index derived from it are replaced together on
/// every attach and detach. Readers take a snapshot and never see a partial
/// update.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<Arc<HashMap<String, ConnectedDevice>>>,
    index: RwLock<Arc<InputIndex>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device and rebuild the index. Replaces any device that was
    /// attached under the same transport name.
    pub fn attach(
        &self,
        transport: Arc<dyn DeviceTransport>,
        record: &DeviceRecord,
    ) -> Arc<InputIndex> {
        let name = transport.name().to_string();
        let inputs = record.inputs.iter().map(|i| i.registered()).collect();
        let index = self.update(|devices| {
            devices.insert(name.clone(), ConnectedDevice { transport, inputs });
        });
        info!(transport = %name, inputs = record.inputs.len(), "device attached");
        index
    }

    /// Forget a device and rebuild the index.
    pub fn detach(&self, name: &str) -> Arc<InputIndex> {
        let index = self.update(|devices| {
            devices.remove(name);
        });
        info!(transport = %name, "device detached");
        index
    }

    fn update<F>(&self, change: F) -> Arc<InputIndex>
    where
        F: FnOnce(&mut HashMap<String, ConnectedDevice>),
    {
        let mut devices = self.devices.write();
        let mut next: HashMap<String, ConnectedDevice> = devices
            .iter()
            .map(|(name, d)| {
                (
                    name.clone(),
                    ConnectedDevice {
                        transport: Arc::clone(&d.transport),
                        inputs: d.inputs.clone(),
                    },
                )
            })
            .collect();
        change(&mut next);

        let index = Arc::new(InputIndex::build(
            next.iter().map(|(name, d)| (name.as_str(), d.inputs.as_slice())),
        ));
        debug!(devices = next.len(), inputs = index.len(), "input index rebuilt");
        *devices = Arc::new(next);
        *self.index.write() = Arc::clone(&index);
        index
    }

    pub fn index(&self) -> Arc<InputIndex> {
        Arc::clone(&self.index.read())
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.devices.read().contains_key(name)
    }

    pub fn device_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.devices.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn transport(&self, name: &str) -> Option<Arc<dyn DeviceTransport>> {
        self.devices
            .read()
            .get(name)
            .map(|d| Arc::clone(&d.transport))
    }

    /// Encode and send a message to an attached device.
    pub async fn send(&self, name: &str, message: &Message) -> Result<(), TswIoError> {
        let transport = self
            .transport(name)
            .ok_or_else(|| TransportError::Closed(name.to_string()))?;
        transport.send_message(message).await
    }
}
