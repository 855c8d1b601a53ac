//! CXA Transport Layer
//!
//! Byte-stream transports between the bridge and the amplifier:
//! - Serial (RS-232 over USB adapter, default)
//! - Memory (in-process, for tests and dry runs)

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use memory::{MemoryDevice, MemoryReceiver, MemorySender, MemoryTransport};
pub use traits::{TransportEvent, TransportReceiver, TransportSender};

#[cfg(feature = "serial")]
pub use serial::{
    SerialConfig, SerialFlowControl, SerialParity, SerialReceiver, SerialSender, SerialTransport,
};
