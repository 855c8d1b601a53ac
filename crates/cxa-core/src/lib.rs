//! CXA Core
//!
//! Protocol primitives for the Cambridge Audio CXA61/CXA81 RS-232 interface.
//!
//! This crate provides:
//! - Command and reply types ([`Command`], [`Reply`])
//! - Frame encoding/decoding ([`codec`])
//! - Reply descriptions ([`interpret`])
//! - Input source mapping ([`Source`])
//! - The shared device state store ([`DeviceStore`])
//! - Mapping of user intents to commands ([`dispatch`])

pub mod codec;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod interpret;
pub mod reply;
pub mod source;
pub mod state;

pub use codec::{decode, encode, encode_reply};
pub use command::Command;
pub use dispatch::{Change, Dispatch};
pub use error::{Error, Result};
pub use interpret::{interpret, Interpretation};
pub use reply::Reply;
pub use source::Source;
pub use state::{DeviceInfo, DeviceState, DeviceStore};

/// Serial baud rate the amplifier expects
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Frame start marker
pub const FRAME_START: u8 = b'#';

/// Frame terminator
pub const FRAME_END: u8 = b'\r';
