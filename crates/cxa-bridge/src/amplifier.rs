//! Amplifier control
//!
//! Every change goes through the same three steps: validate the intent and
//! pick the command, write the command, and only then commit the intended
//! state to the store. A failed write leaves the store as it was; the next
//! reply from the device is the source of truth either way.

use cxa_core::dispatch::{self, Dispatch};
use cxa_core::{codec, Command, DeviceInfo, DeviceState, DeviceStore};
use cxa_transport::TransportSender;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::Result;

/// Amplifier control options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmplifierConfig {
    /// Drop mute and source changes while the amplifier is in standby
    #[serde(default)]
    pub gate_on_power: bool,
}

/// Handle for sending commands to the amplifier. Cheap to clone.
#[derive(Clone)]
pub struct Amplifier {
    sender: Arc<dyn TransportSender>,
    store: Arc<DeviceStore>,
    config: AmplifierConfig,
}

impl Amplifier {
    /// Create an amplifier with a fresh state store
    pub fn new(sender: impl TransportSender + 'static, config: AmplifierConfig) -> Self {
        Self::with_store(Arc::new(sender), Arc::new(DeviceStore::new()), config)
    }

    /// Create an amplifier around an existing store
    pub fn with_store(
        sender: Arc<dyn TransportSender>,
        store: Arc<DeviceStore>,
        config: AmplifierConfig,
    ) -> Self {
        Self {
            sender,
            store,
            config,
        }
    }

    /// The shared state store, for handing to a [`ReplyListener`](crate::ReplyListener)
    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    pub fn snapshot(&self) -> DeviceState {
        self.store.snapshot()
    }

    pub fn info(&self) -> DeviceInfo {
        self.store.info()
    }

    /// Write a single command frame
    pub async fn send(&self, cmd: &Command) -> Result<()> {
        self.sender.send(codec::encode(cmd)).await?;
        debug!("Sent command {}", cmd);
        Ok(())
    }

    /// Ask the amplifier for power, mute, source and version
    pub async fn query_state(&self) -> Result<()> {
        for cmd in &Command::INITIAL_QUERIES {
            self.send(cmd).await?;
        }
        info!("Queried initial amplifier state");
        Ok(())
    }

    /// Apply `on`, `off` or `toggle`.
    ///
    /// Returns the committed state, or `None` when nothing was sent.
    pub async fn set_power(&self, arg: &str) -> Result<Option<DeviceState>> {
        let dispatch = dispatch::power(arg, &self.store.snapshot())?;
        self.execute(dispatch).await
    }

    /// Apply `on`/`muted` or `off`/`unmuted`
    pub async fn set_mute(&self, arg: &str) -> Result<Option<DeviceState>> {
        let dispatch = dispatch::mute(arg)?;
        if self.gated(dispatch.is_some(), "mute") {
            return Ok(None);
        }
        self.execute(dispatch).await
    }

    /// Select an input by name
    pub async fn set_source(&self, arg: &str) -> Result<Option<DeviceState>> {
        let dispatch = dispatch::source(arg)?;
        if self.gated(dispatch.is_some(), "source") {
            return Ok(None);
        }
        self.execute(dispatch).await
    }

    fn gated(&self, has_command: bool, what: &str) -> bool {
        if has_command && self.config.gate_on_power && !self.store.snapshot().powered {
            debug!("Amplifier in standby, ignoring {} change", what);
            return true;
        }
        false
    }

    async fn execute(&self, dispatch: Option<Dispatch>) -> Result<Option<DeviceState>> {
        let Some(Dispatch { command, change }) = dispatch else {
            return Ok(None);
        };

        self.send(&command).await?;
        Ok(Some(self.store.commit(change)))
    }
}
