//! Core transport types.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Opaque identifier of a socket slot on the coprocessor.
///
/// Coprocessors expose a small, fixed pool of slots; the number is only meaningful
/// to the transport that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(u8);

impl Handle {
    /// Wraps a raw slot number.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw slot number.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Connection kinds a coprocessor can open on a socket slot.
///
/// Any session negotiation (TLS handshake, certificate checks) happens on the
/// coprocessor; the host side only selects the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Plain TCP stream.
    #[default]
    Tcp,
    /// UDP "connection" bound to a single peer.
    Udp,
    /// TLS stream terminated on the coprocessor.
    Tls,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
            Self::Tls => write!(f, "tls"),
        }
    }
}

/// A connect target: coprocessors accept either a literal address or a hostname
/// they resolve themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Host {
    /// A literal IP address.
    Ip(IpAddr),
    /// A hostname resolved by the coprocessor.
    Name(String),
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<IpAddr> for Host {
    fn from(ip: IpAddr) -> Self {
        Self::Ip(ip)
    }
}

impl From<&str> for Host {
    fn from(host: &str) -> Self {
        host.parse::<IpAddr>()
            .map_or_else(|_| Self::Name(host.to_string()), Self::Ip)
    }
}

impl From<String> for Host {
    fn from(host: String) -> Self {
        match host.parse::<IpAddr>() {
            Ok(ip) => Self::Ip(ip),
            Err(_) => Self::Name(host),
        }
    }
}

/// A host and port pair handed to a socket's `connect`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteAddr {
    /// Remote host.
    pub host: Host,
    /// Remote port.
    pub port: u16,
}

impl RemoteAddr {
    /// Creates a remote address from anything convertible into a [`Host`].
    pub fn new(host: impl Into<Host>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host {
            Host::Ip(IpAddr::V6(ip)) => write!(f, "[{ip}]:{}", self.port),
            _ => write!(f, "{}:{}", self.host, self.port),
        }
    }
}

impl From<SocketAddr> for RemoteAddr {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl From<(IpAddr, u16)> for RemoteAddr {
    fn from((ip, port): (IpAddr, u16)) -> Self {
        Self::new(ip, port)
    }
}

impl From<(&str, u16)> for RemoteAddr {
    fn from((host, port): (&str, u16)) -> Self {
        Self::new(host, port)
    }
}

impl From<(String, u16)> for RemoteAddr {
    fn from((host, port): (String, u16)) -> Self {
        Self::new(host, port)
    }
}
