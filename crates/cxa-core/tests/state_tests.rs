//! Device state store tests

use cxa_core::{Change, DeviceState, DeviceStore, Reply, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn reply(group: &str, number: &str, data: &str) -> Reply {
    Reply::new(group, number, data)
}

#[test]
fn test_power_off_resets_mute_and_source() {
    let store = DeviceStore::new();
    store.apply_reply(&reply("02", "01", "1"));
    store.apply_reply(&reply("02", "03", "1"));
    store.apply_reply(&reply("04", "01", "04"));
    assert_eq!(
        store.snapshot(),
        DeviceState {
            powered: true,
            muted: true,
            source: Some(Source::D1),
        }
    );

    store.apply_reply(&reply("02", "01", "0"));
    assert_eq!(store.snapshot(), DeviceState::default());
}

#[test]
fn test_power_off_from_any_state() {
    for (powered, muted) in [(false, false), (true, false), (true, true)] {
        let store = DeviceStore::new();
        store.commit(Change::Power(powered));
        store.commit(Change::Mute(muted));

        store.apply_reply(&reply("02", "01", "0"));
        let state = store.snapshot();
        assert!(!state.powered);
        assert!(!state.muted);
        assert_eq!(state.source, None);
    }
}

#[test]
fn test_mute_reply_while_off_keeps_invariant() {
    let store = DeviceStore::new();
    store.apply_reply(&reply("02", "03", "1"));
    assert!(!store.snapshot().muted);
}

#[test]
fn test_power_then_mute() {
    let store = DeviceStore::new();
    store.apply_reply(&reply("02", "01", "1"));
    store.apply_reply(&reply("02", "03", "1"));

    let state = store.snapshot();
    assert!(state.powered);
    assert!(state.muted);
}

#[test]
fn test_source_resolution() {
    let store = DeviceStore::new();
    store.apply_reply(&reply("02", "01", "1"));
    store.apply_reply(&reply("04", "01", "14"));
    assert_eq!(store.snapshot().source_name(), "Bluetooth");

    store.apply_reply(&reply("04", "01", "99"));
    assert_eq!(store.snapshot().source, None);
    assert_eq!(store.snapshot().source_name(), "");
}

#[test]
fn test_informational_replies_change_nothing() {
    let store = DeviceStore::new();
    store.apply_reply(&reply("02", "01", "1"));
    let before = store.snapshot();

    assert!(!store.apply_reply(&reply("00", "01", "")));
    assert!(!store.apply_reply(&reply("99", "99", "1")));
    assert_eq!(store.snapshot(), before);
}

#[test]
fn test_version_replies_fill_info() {
    let store = DeviceStore::new();
    assert!(store.apply_reply(&reply("13", "01", "1.1")));
    assert!(store.apply_reply(&reply("14", "02", "v104-a-105")));

    let info = store.info();
    assert_eq!(info.protocol_version, "1.1");
    assert_eq!(info.firmware_version, "v104-a-105");
    assert_eq!(store.snapshot(), DeviceState::default());
}

#[test]
fn test_power_off_reset_is_atomic_under_concurrency() {
    let store = Arc::new(DeviceStore::new());
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let store = store.clone();
        let done = done.clone();
        thread::spawn(move || {
            for _ in 0..20_000 {
                store.apply_reply(&Reply::new("02", "01", "1"));
                store.apply_reply(&Reply::new("02", "03", "1"));
                store.apply_reply(&Reply::new("02", "01", "0"));
            }
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let state = store.snapshot();
                    assert!(
                        state.powered || !state.muted,
                        "observed muted while powered off: {:?}",
                        state
                    );
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
}
