//! Core transport trait.

use std::net::IpAddr;

use bytes::Bytes;

use crate::error::TransportResult;
use crate::types::{ConnectionMode, Handle, Host};

/// The primitive, polling-based operations of a networking coprocessor.
///
/// Nothing here blocks waiting for network data: `available` reports what the
/// coprocessor has already queued and `read` drains at most that much. Buffering,
/// line framing and timeouts are the socket layer's job.
///
/// One transport is usually shared by several sockets, so every primitive takes
/// `&self`; implementations synchronise access to the underlying bus themselves.
pub trait CoprocessorTransport: Send + Sync + std::fmt::Debug {
    /// Reserves a free socket slot.
    ///
    /// Fails with [`TransportError::NoFreeHandles`](crate::TransportError::NoFreeHandles)
    /// when every slot is taken.
    fn acquire_handle(&self) -> TransportResult<Handle>;

    /// Opens a connection on `handle`.
    ///
    /// Returns `Ok(false)` when the coprocessor reports that the connection could not
    /// be established; `Err` is reserved for failures of the link itself.
    fn connect(
        &self,
        handle: Handle,
        host: &Host,
        port: u16,
        mode: ConnectionMode,
    ) -> TransportResult<bool>;

    /// Sends raw bytes. Segmenting to the coprocessor's command size is the
    /// implementation's responsibility.
    fn write(&self, handle: Handle, data: &[u8]) -> TransportResult<()>;

    /// Returns the number of received bytes queued on the coprocessor.
    fn available(&self, handle: Handle) -> TransportResult<usize>;

    /// Reads up to `len` queued bytes. Callers never ask for more than the last
    /// [`available`](Self::available) reported.
    fn read(&self, handle: Handle, len: usize) -> TransportResult<Bytes>;

    /// Closes the connection and returns the slot to the pool.
    fn close(&self, handle: Handle) -> TransportResult<()>;

    /// Resolves a hostname using the coprocessor's resolver.
    fn resolve_host(&self, name: &str) -> TransportResult<IpAddr>;

    /// The mode used when a caller does not ask for one.
    fn default_mode(&self) -> ConnectionMode {
        ConnectionMode::Tcp
    }
}
