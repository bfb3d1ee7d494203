//! Socket error types.

use std::time::Duration;

use coprosock_transport_traits::TransportError;
use thiserror::Error;

/// A specialized `Result` type for socket operations.
pub type SocketResult<T> = std::result::Result<T, SocketError>;

/// Errors surfaced by sockets and the resolver.
///
/// A sized read that stalls is not an error: it returns fewer bytes than asked for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SocketError {
    /// A caller-supplied argument is not supported (port, family, socket type).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The coprocessor has no free socket slot.
    #[error("No free sockets available on the coprocessor")]
    ResourceExhausted,

    /// The coprocessor could not open a connection.
    #[error("Failed to connect to host {host}")]
    ConnectionFailed {
        /// The host that refused or could not be reached
        host: String,
    },

    /// No complete line arrived within the caller's timeout. The socket has been
    /// closed.
    #[error(
        "Read timed out after {timeout:?} without a complete line; the socket was closed. \
         Raise the limit with `set_timeout` or pass `None` to block"
    )]
    ReadTimeout {
        /// The timeout that was exceeded
        timeout: Duration,
    },

    /// The socket was closed and accepts no further operations.
    #[error("Socket is closed")]
    Closed,

    /// A data operation was attempted before a successful connect.
    #[error("Socket is not connected")]
    NotConnected,

    /// A transport primitive failed.
    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for SocketError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NoFreeHandles => Self::ResourceExhausted,
            other => Self::Transport(other),
        }
    }
}

impl SocketError {
    /// Returns `true` if the error left the socket closed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ReadTimeout { .. } | Self::Closed)
    }
}
