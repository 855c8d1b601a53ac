//! In-memory transport
//!
//! Connects the bridge to a [`MemoryDevice`] inside the same process. The
//! device end injects reply bytes and observes every frame the bridge
//! writes, which is what the integration tests and `--dry-run` use in place
//! of a real amplifier.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{TransportEvent, TransportReceiver, TransportSender};

/// In-memory transport
pub struct MemoryTransport;

impl MemoryTransport {
    /// Create a connected sender/receiver pair and the device end driving it
    pub fn pair() -> (MemorySender, MemoryReceiver, MemoryDevice) {
        let (event_tx, event_rx) = mpsc::channel(100);
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(Mutex::new(true));

        let sender = MemorySender {
            written: write_tx,
            connected: connected.clone(),
        };
        let receiver = MemoryReceiver { rx: event_rx };
        let device = MemoryDevice {
            events: event_tx,
            written: write_rx,
            connected,
        };

        (sender, receiver, device)
    }
}

/// Bridge-side sender
pub struct MemorySender {
    written: mpsc::UnboundedSender<Bytes>,
    connected: Arc<Mutex<bool>>,
}

#[async_trait]
impl TransportSender for MemorySender {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let len = data.len();
        self.written
            .send(data)
            .map_err(|_| TransportError::SendFailed("device end dropped".into()))?;

        debug!("Memory transport sent {} bytes", len);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        Ok(())
    }
}

/// Bridge-side receiver
pub struct MemoryReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for MemoryReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

/// Device end of a memory transport
pub struct MemoryDevice {
    events: mpsc::Sender<TransportEvent>,
    written: mpsc::UnboundedReceiver<Bytes>,
    connected: Arc<Mutex<bool>>,
}

impl MemoryDevice {
    /// Deliver bytes to the bridge as one read
    pub async fn reply(&self, data: impl Into<Bytes>) -> Result<()> {
        self.push(TransportEvent::Data(data.into())).await
    }

    /// Report a read error to the bridge
    pub async fn read_error(&self, message: impl Into<String>) -> Result<()> {
        self.push(TransportEvent::Error(message.into())).await
    }

    /// End the stream
    pub async fn disconnect(&self, reason: Option<String>) -> Result<()> {
        *self.connected.lock() = false;
        self.push(TransportEvent::Disconnected { reason }).await
    }

    /// Make subsequent writes from the bridge fail (or succeed again)
    pub fn set_connected(&self, connected: bool) {
        *self.connected.lock() = connected;
    }

    /// Wait for the next frame written by the bridge
    pub async fn next_write(&mut self) -> Option<Bytes> {
        self.written.recv().await
    }

    /// Everything written so far, without waiting
    pub fn drain_writes(&mut self) -> Vec<Bytes> {
        let mut out = Vec::new();
        while let Ok(data) = self.written.try_recv() {
            out.push(data);
        }
        out
    }

    async fn push(&self, event: TransportEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }
}
