//! Transport error types.

use thiserror::Error;

use crate::types::Handle;

/// A specialized `Result` type for transport primitives.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Represents failures reported by a coprocessor transport primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// Every socket slot on the coprocessor is in use.
    #[error("No free sockets available on the coprocessor")]
    NoFreeHandles,

    /// The handle does not refer to an allocated socket slot.
    #[error("Invalid socket handle: {0}")]
    InvalidHandle(Handle),

    /// Hostname lookup on the coprocessor failed.
    #[error("Host not found: {0}")]
    HostNotFound(String),

    /// The coprocessor rejected a command or answered with a malformed response.
    #[error("Link error: {0}")]
    Link(String),

    /// An underlying I/O error occurred on the bus.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
