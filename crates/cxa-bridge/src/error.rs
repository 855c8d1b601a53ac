//! Bridge error types

use cxa_transport::TransportError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Protocol(#[from] cxa_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bridge error: {0}")]
    Other(String),
}

impl BridgeError {
    /// True for bad user input, as opposed to device or server failures
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, BridgeError::Protocol(e) if e.is_invalid_argument())
    }
}
