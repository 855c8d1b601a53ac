//! Error types for the CXA protocol layer

use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A non-empty read contained no `#GG,NN[,DATA]\r` frame
    #[error("invalid reply format: {0:?}")]
    MalformedFrame(String),

    /// A user-supplied power/mute/source value was not recognised
    #[error("{0}")]
    InvalidArgument(String),
}

impl Error {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }
}
