//! `getaddrinfo`-style address resolution through the coprocessor.

use std::net::SocketAddr;

use coprosock_transport_traits::CoprocessorTransport;
use tracing::debug;

use crate::error::{SocketError, SocketResult};
use crate::types::{AddressFamily, SocketType};

/// The port argument of [`getaddrinfo`].
///
/// Only numeric ports are accepted; service names are rejected rather than looked
/// up, since coprocessors have no services database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service<'a> {
    /// A numeric port, validated to fit in `u16`.
    Port(i64),
    /// A service name or numeric string such as `"http"` or `"80"`.
    Name(&'a str),
}

impl From<u16> for Service<'_> {
    fn from(port: u16) -> Self {
        Self::Port(i64::from(port))
    }
}

impl From<i32> for Service<'_> {
    fn from(port: i32) -> Self {
        Self::Port(i64::from(port))
    }
}

impl From<i64> for Service<'_> {
    fn from(port: i64) -> Self {
        Self::Port(port)
    }
}

impl<'a> From<&'a str> for Service<'a> {
    fn from(name: &'a str) -> Self {
        Self::Name(name)
    }
}

impl Service<'_> {
    fn port(self) -> SocketResult<u16> {
        match self {
            Self::Port(port) => u16::try_from(port).map_err(|_| {
                SocketError::InvalidArgument(format!("port {port} is out of range"))
            }),
            Self::Name(name) => Err(SocketError::InvalidArgument(format!(
                "port must be an integer, got {name:?}"
            ))),
        }
    }
}

/// Optional hints; `socktype` and `proto` are echoed back, the rest is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddrInfoHints {
    /// Requested family (ignored, results are always IPv4).
    pub family: Option<AddressFamily>,
    /// Requested socket type.
    pub socktype: Option<SocketType>,
    /// Requested protocol number.
    pub proto: i32,
    /// `AI_*` flags (ignored).
    pub flags: i32,
}

/// One resolution result, shaped like a `getaddrinfo` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrInfo {
    /// Always [`AddressFamily::Inet`].
    pub family: AddressFamily,
    /// Socket type from the hints.
    pub socktype: Option<SocketType>,
    /// Protocol number from the hints.
    pub proto: i32,
    /// Canonical name; always empty.
    pub canonname: String,
    /// Resolved address and requested port.
    pub addr: SocketAddr,
}

/// Resolves `host` using the coprocessor and pairs it with `port`.
///
/// Always yields exactly one entry. Nothing is cached.
pub fn getaddrinfo<'a>(
    transport: &dyn CoprocessorTransport,
    host: &str,
    port: impl Into<Service<'a>>,
    hints: AddrInfoHints,
) -> SocketResult<Vec<AddrInfo>> {
    let port = port.into().port()?;
    let ip = transport.resolve_host(host)?;
    debug!(host, %ip, port, "resolved host");

    Ok(vec![AddrInfo {
        family: AddressFamily::Inet,
        socktype: hints.socktype,
        proto: hints.proto,
        canonname: String::new(),
        addr: SocketAddr::new(ip, port),
    }])
}
