//! Device state store
//!
//! Holds the last known amplifier state. Replies from the device and
//! committed dispatcher changes are the only writers. Every write runs in a
//! single critical section so readers never see a half-applied update.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

use crate::source::serialize_opt;
use crate::{Change, Reply, Source};

/// Snapshot of amplifier state, serialized as the HTTP status body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceState {
    #[serde(rename = "power")]
    pub powered: bool,
    #[serde(rename = "mute")]
    pub muted: bool,
    #[serde(serialize_with = "serialize_opt")]
    pub source: Option<Source>,
}

impl DeviceState {
    /// Set power, clearing mute and source when powering off
    fn set_powered(&mut self, powered: bool) {
        self.powered = powered;
        if !powered {
            self.muted = false;
            self.source = None;
        }
    }

    // Mute and source only hold while powered.
    fn set_muted(&mut self, muted: bool) {
        self.muted = muted && self.powered;
    }

    fn set_source(&mut self, source: Option<Source>) {
        let powered = self.powered;
        self.source = source.filter(|_| powered);
    }

    fn apply(&mut self, change: Change) {
        match change {
            Change::Power(on) => self.set_powered(on),
            Change::Mute(on) => self.set_muted(on),
            Change::Source(source) => self.set_source(Some(source)),
        }
    }

    /// Name of the current source, empty when unknown
    pub fn source_name(&self) -> &'static str {
        self.source.map(Source::name).unwrap_or("")
    }
}

/// Version strings reported by the amplifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    #[serde(rename = "protocol")]
    pub protocol_version: String,
    #[serde(rename = "firmware")]
    pub firmware_version: String,
}

#[derive(Debug, Default)]
struct Inner {
    state: DeviceState,
    info: DeviceInfo,
}

/// Shared, lock-protected device state
#[derive(Debug, Default)]
pub struct DeviceStore {
    inner: Mutex<Inner>,
}

impl DeviceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> DeviceState {
        self.inner.lock().state
    }

    /// Copy of the reported version strings
    pub fn info(&self) -> DeviceInfo {
        self.inner.lock().info.clone()
    }

    /// Apply a reply from the device.
    ///
    /// Returns true if the reply is one that carries state; informational
    /// and unknown replies leave the store untouched.
    pub fn apply_reply(&self, reply: &Reply) -> bool {
        let mut inner = self.inner.lock();

        match (reply.group.as_str(), reply.number.as_str()) {
            ("02", "01") => inner.state.set_powered(reply.data == "1"),
            ("02", "03") => inner.state.set_muted(reply.data == "1"),
            ("04", "01") => inner.state.set_source(Source::from_code(&reply.data)),
            ("13" | "14", "01") => inner.info.protocol_version = reply.data.clone(),
            ("13" | "14", "02") => inner.info.firmware_version = reply.data.clone(),
            _ => return false,
        }

        trace!("Applied {},{}: {:?}", reply.group, reply.number, inner.state);
        true
    }

    /// Commit a change after its command was sent
    pub fn commit(&self, change: Change) -> DeviceState {
        let mut inner = self.inner.lock();
        inner.state.apply(change);
        inner.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_zeroed() {
        let store = DeviceStore::new();
        assert_eq!(store.snapshot(), DeviceState::default());
        assert_eq!(store.info(), DeviceInfo::default());
    }

    #[test]
    fn test_commit_power_off_resets() {
        let store = DeviceStore::new();
        store.commit(Change::Power(true));
        store.commit(Change::Mute(true));
        store.commit(Change::Source(Source::D1));

        let state = store.commit(Change::Power(false));
        assert_eq!(state, DeviceState::default());
    }

    #[test]
    fn test_mute_and_source_ignored_while_off() {
        let store = DeviceStore::new();
        store.commit(Change::Mute(true));
        store.apply_reply(&Reply::new("02", "03", "1"));
        store.apply_reply(&Reply::new("04", "01", "00"));
        assert_eq!(store.snapshot(), DeviceState::default());
    }

    #[test]
    fn test_serialize_status_body() {
        let state = DeviceState {
            powered: true,
            muted: false,
            source: Some(Source::A1Balanced),
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"power": true, "mute": false, "source": "A1 Balanced"})
        );

        let json = serde_json::to_value(DeviceState::default()).unwrap();
        assert_eq!(json["source"], "");
    }
}
