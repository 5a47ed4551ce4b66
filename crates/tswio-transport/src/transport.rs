//! The transport seam.

use std::sync::Arc;

use async_trait::async_trait;
use tswio_errors::TswIoError;
use tswio_protocol::Message;

use crate::TransportResult;

/// A channel to one controller board carrying whole frames.
///
/// `send` and `recv` take `&self`: a transport is shared by the connection
/// task reading inputs and by every lever, button and output writing to it.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Stable identifier, used in the `(transport, pin)` input index.
    fn name(&self) -> &str;

    async fn send(&self, frame: &[u8]) -> TransportResult<()>;

    /// Wait for the next complete frame.
    async fn recv(&self) -> TransportResult<Vec<u8>>;
}

#[async_trait]
impl<T: DeviceTransport + ?Sized> DeviceTransport for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn send(&self, frame: &[u8]) -> TransportResult<()> {
        (**self).send(frame).await
    }

    async fn recv(&self) -> TransportResult<Vec<u8>> {
        (**self).recv().await
    }
}

/// Message-level helpers on top of raw frames.
#[async_trait]
pub trait DeviceTransportExt: DeviceTransport {
    async fn send_message(&self, message: &Message) -> Result<(), TswIoError> {
        let frame = message.encode()?;
        self.send(&frame).await?;
        Ok(())
    }

    async fn recv_message(&self) -> Result<Message, TswIoError> {
        let frame = self.recv().await?;
        Ok(Message::decode_any(&frame)?)
    }
}

impl<T: DeviceTransport + ?Sized> DeviceTransportExt for T {}
