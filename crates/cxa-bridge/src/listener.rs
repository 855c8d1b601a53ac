//! Reply ingestion
//!
//! A single task reads from the transport, decodes each read and applies
//! the replies to the store in order. Read errors are logged and the task
//! keeps going; it ends when cancelled or when the transport closes.

use cxa_core::{codec, interpret, DeviceStore, Error};
use cxa_transport::{TransportError, TransportEvent, TransportReceiver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{BridgeError, Result};

/// What to do with a read that contains no valid frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedFramePolicy {
    /// Log the read and keep listening
    #[default]
    Skip,
    /// Stop the listener with an error
    Fail,
}

/// Applies amplifier replies to a [`DeviceStore`]
pub struct ReplyListener<R> {
    receiver: R,
    store: Arc<DeviceStore>,
    policy: MalformedFramePolicy,
}

impl<R: TransportReceiver + 'static> ReplyListener<R> {
    pub fn new(receiver: R, store: Arc<DeviceStore>) -> Self {
        Self {
            receiver,
            store,
            policy: MalformedFramePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MalformedFramePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run on a background task until `cancel` fires
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run(cancel))
    }

    /// Process transport events until cancelled or the transport closes
    pub async fn run(mut self, cancel: CancellationToken) -> Result<()> {
        info!("Listening for amplifier replies");

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Reply listener stopped");
                    return Ok(());
                }
                event = self.receiver.recv() => event,
            };

            match event {
                Some(TransportEvent::Data(data)) => {
                    self.handle_read(&data)?;
                }
                Some(TransportEvent::Error(e)) => {
                    warn!("Amplifier read failed: {}", e);
                }
                Some(TransportEvent::Disconnected { reason }) => {
                    warn!(
                        "Amplifier disconnected: {}",
                        reason.as_deref().unwrap_or("end of stream")
                    );
                    return Err(TransportError::ConnectionClosed.into());
                }
                None => return Err(TransportError::ConnectionClosed.into()),
            }
        }
    }

    /// Decode one read and apply its replies. Returns the number applied.
    fn handle_read(&self, data: &[u8]) -> Result<usize> {
        debug!("Response from amp {:?}", String::from_utf8_lossy(data));

        let replies = match codec::decode(data) {
            Ok(replies) => replies,
            Err(e @ Error::MalformedFrame(_)) => match self.policy {
                MalformedFramePolicy::Skip => {
                    warn!("Discarding read: {}", e);
                    return Ok(0);
                }
                MalformedFramePolicy::Fail => return Err(BridgeError::Protocol(e)),
            },
            Err(e) => return Err(e.into()),
        };

        for reply in &replies {
            let described = interpret(reply);
            if described.known {
                info!("Received: {}", described);
            } else {
                info!("Ignoring reply: {}", described);
            }
            self.store.apply_reply(reply);
        }

        Ok(replies.len())
    }
}
