//! Memory transport tests

use bytes::Bytes;
use cxa_transport::{
    MemoryTransport, TransportError, TransportEvent, TransportReceiver, TransportSender,
};

#[tokio::test]
async fn test_writes_reach_device_in_order() {
    let (sender, _receiver, mut device) = MemoryTransport::pair();

    sender.send(Bytes::from_static(b"#01,01\r")).await.unwrap();
    sender.send(Bytes::from_static(b"#01,03\r")).await.unwrap();

    assert_eq!(device.next_write().await.unwrap(), &b"#01,01\r"[..]);
    assert_eq!(device.drain_writes(), vec![Bytes::from_static(b"#01,03\r")]);
    assert!(device.drain_writes().is_empty());
}

#[tokio::test]
async fn test_device_replies_arrive_as_reads() {
    let (_sender, mut receiver, device) = MemoryTransport::pair();

    device.reply(&b"#02,01,1\r"[..]).await.unwrap();
    device.read_error("framing error").await.unwrap();

    match receiver.recv().await {
        Some(TransportEvent::Data(data)) => assert_eq!(data, &b"#02,01,1\r"[..]),
        other => panic!("expected data, got {:?}", other),
    }
    match receiver.recv().await {
        Some(TransportEvent::Error(msg)) => assert_eq!(msg, "framing error"),
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_disconnect_fails_writes() {
    let (sender, mut receiver, device) = MemoryTransport::pair();

    device.disconnect(Some("unplugged".into())).await.unwrap();
    assert!(!sender.is_connected());
    assert!(matches!(
        sender.send(Bytes::from_static(b"#01,01\r")).await,
        Err(TransportError::NotConnected)
    ));
    assert!(matches!(
        receiver.recv().await,
        Some(TransportEvent::Disconnected { .. })
    ));
}

#[tokio::test]
async fn test_dropped_device_ends_stream() {
    let (sender, mut receiver, device) = MemoryTransport::pair();
    drop(device);

    assert!(receiver.recv().await.is_none());
    assert!(matches!(
        sender.send(Bytes::from_static(b"#01,01\r")).await,
        Err(TransportError::SendFailed(_))
    ));
}

#[tokio::test]
async fn test_close_marks_sender_disconnected() {
    let (sender, _receiver, _device) = MemoryTransport::pair();
    assert!(sender.is_connected());
    sender.close().await.unwrap();
    assert!(!sender.is_connected());
}
