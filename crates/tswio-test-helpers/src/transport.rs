//! In-memory device transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tswio_errors::TransportError;
use tswio_protocol::Message;
use tswio_transport::{DeviceTransport, TransportResult};

use crate::must;

/// A transport whose board side is driven by the test.
///
/// Frames the bridge sends are recorded; frames the test pushes are handed to
/// `recv` in order. Dropping the board side with [`MockTransport::hang_up`]
/// makes `recv` report the transport as closed.
pub struct MockTransport {
    name: String,
    sent: Mutex<Vec<Vec<u8>>>,
    inbound_tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    inbound_rx: AsyncMutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    fail_sends: AtomicBool,
}

impl MockTransport {
    pub fn new(name: &str) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            name: name.to_string(),
            sent: Mutex::new(Vec::new()),
            inbound_tx: Mutex::new(Some(tx)),
            inbound_rx: AsyncMutex::new(rx),
            fail_sends: AtomicBool::new(false),
        })
    }

    /// Queue a raw frame for the bridge to receive.
    pub fn push_frame(&self, frame: Vec<u8>) {
        if let Some(tx) = self.inbound_tx.lock().as_ref() {
            let _ = tx.send(frame);
        }
    }

    /// Queue an encoded message for the bridge to receive.
    pub fn push_message(&self, message: impl Into<Message>) {
        let frame = must(message.into().encode());
        self.push_frame(frame);
    }

    pub fn hang_up(&self) {
        self.inbound_tx.lock().take();
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    /// Sent frames decoded back into messages. Undecodable frames are skipped.
    pub fn sent_messages(&self) -> Vec<Message> {
        self.sent
            .lock()
            .iter()
            .filter_map(|f| Message::decode_any(f).ok())
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, frame: &[u8]) -> TransportResult<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::io(&self.name, "injected send failure"));
        }
        self.sent.lock().push(frame.to_vec());
        Ok(())
    }

    async fn recv(&self) -> TransportResult<Vec<u8>> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| TransportError::Closed(self.name.clone()))
    }
}
