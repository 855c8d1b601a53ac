//! CXA Bridge
//!
//! Ties the protocol layer to a transport and exposes it over HTTP:
//! - [`Amplifier`] turns user intents into commands and commits state
//! - [`ReplyListener`] ingests replies into the shared [`DeviceStore`]
//! - [`Simulator`] answers like an amplifier over a memory transport
//! - [`http`] serves the status/control API
//!
//! [`DeviceStore`]: cxa_core::DeviceStore

pub mod amplifier;
pub mod error;
pub mod listener;
pub mod simulator;

#[cfg(feature = "http")]
pub mod auth;
#[cfg(feature = "http")]
pub mod http;

pub use amplifier::{Amplifier, AmplifierConfig};
pub use error::{BridgeError, Result};
pub use listener::{MalformedFramePolicy, ReplyListener};
pub use simulator::Simulator;

#[cfg(feature = "http")]
pub use auth::BasicAuth;
#[cfg(feature = "http")]
pub use http::{HttpServer, HttpServerConfig};
