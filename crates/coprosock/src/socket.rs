//! Stream sockets over a coprocessor transport.
//!
//! A [`StreamSocket`] owns one transport handle and a FIFO receive buffer. All reads
//! are poll loops over the transport's available-byte count:
//!
//! - `read(0)` drains whatever is queued right now and never waits
//! - `read(n)` waits for `n` bytes but gives up after the configured stall bound
//!   without progress, returning a short result
//! - `readline()` waits for a CRLF and, when the caller's timeout runs out, closes the
//!   socket and fails with [`SocketError::ReadTimeout`]

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use bytes::Bytes;
use coprosock_transport_traits::{
    ConnectionMode, CoprocessorTransport, Handle, LinkMetrics, RemoteAddr,
};
use tracing::{debug, error, trace, warn};

use crate::buffer::ReceiveBuffer;
use crate::clock::{Clock, MonotonicClock};
use crate::config::SocketConfig;
use crate::error::{SocketError, SocketResult};
use crate::resolver::{AddrInfo, AddrInfoHints, Service, getaddrinfo};
use crate::types::{AddressFamily, SocketState, SocketType};

/// Creates sockets bound to one coprocessor transport.
///
/// The factory is the single place the transport is handed to; sockets it creates
/// share the transport, the clock, the configuration and the link metrics.
#[derive(Debug, Clone)]
pub struct SocketFactory {
    transport: Arc<dyn CoprocessorTransport>,
    clock: Arc<dyn Clock>,
    config: SocketConfig,
    metrics: Arc<LinkMetrics>,
}

impl SocketFactory {
    /// Create a factory with the default configuration and the monotonic clock
    pub fn new(transport: Arc<dyn CoprocessorTransport>) -> Self {
        Self {
            transport,
            clock: Arc::new(MonotonicClock),
            config: SocketConfig::default(),
            metrics: Arc::new(LinkMetrics::new()),
        }
    }

    /// Use `config` for sockets created from now on
    #[must_use]
    pub fn with_config(mut self, config: SocketConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `clock` for poll loops of sockets created from now on
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The shared transport
    pub fn transport(&self) -> &Arc<dyn CoprocessorTransport> {
        &self.transport
    }

    /// The configuration new sockets receive
    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// Counters aggregated over every socket of this factory
    pub fn metrics(&self) -> &Arc<LinkMetrics> {
        &self.metrics
    }

    /// Resolve `host` through this factory's transport, see [`getaddrinfo`]
    pub fn getaddrinfo<'a>(
        &self,
        host: &str,
        port: impl Into<Service<'a>>,
        hints: AddrInfoHints,
    ) -> SocketResult<Vec<AddrInfo>> {
        getaddrinfo(self.transport.as_ref(), host, port, hints)
    }

    /// Create a socket.
    ///
    /// Only `AF_INET` / `SOCK_STREAM` is supported; anything else fails with
    /// [`SocketError::InvalidArgument`] before a handle is acquired. A coprocessor
    /// without a free slot yields [`SocketError::ResourceExhausted`].
    pub fn socket(
        &self,
        family: AddressFamily,
        socket_type: SocketType,
    ) -> SocketResult<StreamSocket> {
        if family != AddressFamily::Inet {
            return Err(SocketError::InvalidArgument(format!(
                "only AF_INET family supported, got {family}"
            )));
        }
        if socket_type != SocketType::Stream {
            return Err(SocketError::InvalidArgument(format!(
                "only SOCK_STREAM type supported, got {socket_type}"
            )));
        }

        let handle = self.transport.acquire_handle()?;
        debug!(%handle, "socket created");

        Ok(StreamSocket {
            transport: Arc::clone(&self.transport),
            clock: Arc::clone(&self.clock),
            metrics: Arc::clone(&self.metrics),
            max_packet: self.config.max_packet.max(1),
            stall_timeout: self.config.stall_timeout(),
            poll_interval: self.config.poll_interval(),
            handle,
            family,
            socket_type,
            buffer: ReceiveBuffer::new(),
            timeout: self.config.default_timeout(),
            state: SocketState::Created,
        })
    }

    /// Create an `AF_INET` / `SOCK_STREAM` socket
    pub fn stream(&self) -> SocketResult<StreamSocket> {
        self.socket(AddressFamily::Inet, SocketType::Stream)
    }
}

/// A blocking byte-stream socket on one coprocessor slot.
///
/// Not thread-safe by itself: every operation takes `&mut self` and runs its poll
/// loop on the calling thread.
#[derive(Debug)]
pub struct StreamSocket {
    transport: Arc<dyn CoprocessorTransport>,
    clock: Arc<dyn Clock>,
    metrics: Arc<LinkMetrics>,
    max_packet: usize,
    stall_timeout: Duration,
    poll_interval: Duration,
    handle: Handle,
    family: AddressFamily,
    socket_type: SocketType,
    buffer: ReceiveBuffer,
    timeout: Option<Duration>,
    state: SocketState,
}

impl StreamSocket {
    /// Connect to `address`.
    ///
    /// `mode: None` uses the transport's default mode. Only a successful connect
    /// clears previously buffered bytes; a refused connect leaves the buffer and
    /// the state as they were. There is no retry.
    pub fn connect(
        &mut self,
        address: impl Into<RemoteAddr>,
        mode: Option<ConnectionMode>,
    ) -> SocketResult<()> {
        self.ensure_open()?;
        let RemoteAddr { host, port } = address.into();
        let mode = mode.unwrap_or_else(|| self.transport.default_mode());

        debug!(handle = %self.handle, %host, port, %mode, "connecting");
        self.metrics.connect_attempts.fetch_add(1, Ordering::Relaxed);

        if !self.transport.connect(self.handle, &host, port, mode)? {
            self.metrics.failed_connects.fetch_add(1, Ordering::Relaxed);
            return Err(SocketError::ConnectionFailed {
                host: host.to_string(),
            });
        }

        self.buffer.clear();
        self.state = SocketState::Connected;
        Ok(())
    }

    /// Send `data` as-is; segmenting is up to the transport.
    pub fn write(&mut self, data: &[u8]) -> SocketResult<()> {
        self.ensure_connected()?;
        self.transport.write(self.handle, data)?;
        self.metrics.record_sent(data.len());
        self.buffer.release();
        Ok(())
    }

    /// Read buffered and queued bytes.
    ///
    /// With `size == 0`, returns everything buffered plus everything the coprocessor
    /// has queued right now, without waiting.
    ///
    /// With `size > 0`, waits until `size` bytes are buffered, or until no new byte
    /// has arrived for the stall timeout. The result may therefore be shorter than
    /// `size`; that is not an error. Surplus bytes stay buffered.
    pub fn read(&mut self, size: usize) -> SocketResult<Bytes> {
        self.ensure_connected()?;
        if size == 0 {
            return self.drain();
        }

        let mut remaining = size.saturating_sub(self.buffer.len());
        let mut last_progress = self.clock.now();

        while remaining > 0 {
            let available = self.poll_available(remaining.min(self.max_packet))?;
            if available > 0 {
                let received = self.receive(available)?;
                if received > 0 {
                    remaining = remaining.saturating_sub(received);
                    last_progress = self.clock.now();
                    continue;
                }
            }

            let stalled = self.clock.now().saturating_duration_since(last_progress);
            if stalled > self.stall_timeout {
                warn!(
                    handle = %self.handle,
                    requested = size,
                    buffered = self.buffer.len(),
                    "read stalled, returning short"
                );
                self.metrics.short_reads.fetch_add(1, Ordering::Relaxed);
                break;
            }
            self.clock.sleep(self.poll_interval);
        }

        let data = if self.buffer.len() == size {
            self.buffer.take_all()
        } else {
            self.buffer.take_prefix(size)
        };
        self.buffer.release();
        Ok(data)
    }

    /// Read up to, not including, the next CRLF.
    ///
    /// Blocks until a full line is buffered. With a timeout set, running out of time
    /// closes the socket and fails with [`SocketError::ReadTimeout`]; no partial line
    /// is returned.
    pub fn readline(&mut self) -> SocketResult<Bytes> {
        self.ensure_connected()?;
        let started = self.clock.now();
        let mut scan_from = 0;

        let crlf = loop {
            if let Some(pos) = self.buffer.find_crlf(scan_from) {
                break pos;
            }
            // A delimiter may straddle the old tail and the next chunk
            scan_from = self.buffer.len().saturating_sub(1);

            let available = self.poll_available(self.max_packet)?;
            if available > 0 && self.receive(available)? > 0 {
                continue;
            }

            if let Some(timeout) = self.timeout
                && self.clock.now().saturating_duration_since(started) > timeout
            {
                warn!(handle = %self.handle, ?timeout, "no complete line before timeout, closing");
                self.metrics.read_timeouts.fetch_add(1, Ordering::Relaxed);
                self.shutdown();
                return Err(SocketError::ReadTimeout { timeout });
            }
            self.clock.sleep(self.poll_interval);
        };

        let line = self.buffer.take_line(crlf);
        self.buffer.release();
        Ok(line)
    }

    /// Release the handle. The socket rejects every operation afterwards,
    /// including a second `close`.
    ///
    /// If the transport fails to release the handle the socket stays open, so the
    /// close can be retried and `Drop` still attempts it.
    pub fn close(&mut self) -> SocketResult<()> {
        self.ensure_open()?;
        self.transport.close(self.handle)?;
        self.state = SocketState::Closed;
        debug!(handle = %self.handle, "socket closed");
        Ok(())
    }

    /// Set the line-read timeout. `None` or a zero duration blocks forever.
    ///
    /// Sized reads are bounded by the factory's stall timeout instead.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> SocketResult<()> {
        self.ensure_open()?;
        self.timeout = timeout.filter(|t| !t.is_zero());
        Ok(())
    }

    /// The line-read timeout; `None` blocks.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The transport handle this socket owns.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SocketState {
        self.state
    }

    /// Always [`AddressFamily::Inet`].
    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Always [`SocketType::Stream`].
    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Bytes received but not yet returned to the caller.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Link counters shared with the factory.
    pub fn metrics(&self) -> &Arc<LinkMetrics> {
        &self.metrics
    }

    fn drain(&mut self) -> SocketResult<Bytes> {
        loop {
            let available = self.poll_available(self.max_packet)?;
            if available == 0 || self.receive(available)? == 0 {
                break;
            }
        }
        let data = self.buffer.take_all();
        self.buffer.release();
        Ok(data)
    }

    fn poll_available(&self, cap: usize) -> SocketResult<usize> {
        Ok(self.transport.available(self.handle)?.min(cap))
    }

    fn receive(&mut self, len: usize) -> SocketResult<usize> {
        let chunk = self.transport.read(self.handle, len)?;
        trace!(handle = %self.handle, len = chunk.len(), "received chunk");
        self.metrics.record_received(chunk.len());
        self.buffer.extend(&chunk);
        Ok(chunk.len())
    }

    /// Forced close on the timeout path; the timeout is what the caller sees.
    fn shutdown(&mut self) {
        self.state = SocketState::Closed;
        if let Err(e) = self.transport.close(self.handle) {
            warn!(handle = %self.handle, error = %e, "close after read timeout failed");
        }
    }

    fn ensure_open(&self) -> SocketResult<()> {
        match self.state {
            SocketState::Closed => Err(SocketError::Closed),
            SocketState::Created | SocketState::Connected => Ok(()),
        }
    }

    fn ensure_connected(&self) -> SocketResult<()> {
        match self.state {
            SocketState::Connected => Ok(()),
            SocketState::Created => Err(SocketError::NotConnected),
            SocketState::Closed => Err(SocketError::Closed),
        }
    }
}

impl Drop for StreamSocket {
    fn drop(&mut self) {
        if self.state != SocketState::Closed {
            self.state = SocketState::Closed;
            if let Err(e) = self.transport.close(self.handle) {
                error!(handle = %self.handle, error = %e, "failed to release handle on drop");
            }
        }
    }
}
