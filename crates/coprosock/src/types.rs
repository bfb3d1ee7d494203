//! Socket families, types and lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address family requested at socket construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFamily {
    /// IPv4 (`AF_INET`), the only family coprocessors support.
    Inet,
    /// IPv6 (`AF_INET6`).
    Inet6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inet => write!(f, "AF_INET"),
            Self::Inet6 => write!(f, "AF_INET6"),
        }
    }
}

/// Socket type requested at socket construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketType {
    /// Connection-oriented byte stream (`SOCK_STREAM`).
    Stream,
    /// Datagrams (`SOCK_DGRAM`).
    Datagram,
    /// Raw packets (`SOCK_RAW`).
    Raw,
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream => write!(f, "SOCK_STREAM"),
            Self::Datagram => write!(f, "SOCK_DGRAM"),
            Self::Raw => write!(f, "SOCK_RAW"),
        }
    }
}

/// Lifecycle of a [`StreamSocket`](crate::StreamSocket).
///
/// `Created -> Connected -> Closed`; a socket may be reconnected while not closed,
/// and nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocketState {
    /// Handle acquired, no connection yet.
    Created,
    /// The last connect succeeded.
    Connected,
    /// Handle released.
    Closed,
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Connected => write!(f, "connected"),
            Self::Closed => write!(f, "closed"),
        }
    }
}
