//! Transport trait definitions

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Events delivered by a transport's receive side
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Bytes from a single read
    Data(Bytes),
    /// A read failed; the transport keeps trying
    Error(String),
    /// The stream ended and no more events will follow
    Disconnected { reason: Option<String> },
}

/// Trait for sending data
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Send data, returning once it has been written
    async fn send(&self, data: Bytes) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Close the sender
    async fn close(&self) -> Result<()>;
}

/// Trait for receiving data
#[async_trait]
pub trait TransportReceiver: Send {
    /// Receive the next event, `None` once the transport is gone
    async fn recv(&mut self) -> Option<TransportEvent>;
}
