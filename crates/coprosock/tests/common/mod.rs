//! Shared fixtures for coprosock integration tests

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use coprosock::{
    ConnectionMode, CoprocessorTransport, Handle, Host, LoopbackTransport, ManualClock,
    SocketConfig, SocketFactory, TransportError, TransportResult,
};
use parking_lot::Mutex;

pub const EXAMPLE_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34));

/// Poll interval used by every fixture; each idle poll advances the manual clock by it.
pub const POLL: Duration = Duration::from_millis(50);

pub struct Fixture {
    pub transport: Arc<LoopbackTransport>,
    pub clock: Arc<ManualClock>,
    pub factory: SocketFactory,
}

pub fn fixture() -> Fixture {
    fixture_with(LoopbackTransport::new())
}

pub fn fixture_with(transport: LoopbackTransport) -> Fixture {
    let transport = Arc::new(transport.with_host("example.com", EXAMPLE_IP));
    let clock = Arc::new(ManualClock::new());
    let factory = SocketFactory::new(transport.clone())
        .with_clock(clock.clone())
        .with_config(SocketConfig::default().with_poll_interval(POLL));
    Fixture {
        transport,
        clock,
        factory,
    }
}

/// Loopback transport that reports nothing available for the first `silent_polls`
/// polls of `available`.
#[derive(Debug)]
pub struct SlowStartTransport {
    pub inner: LoopbackTransport,
    silent_polls: AtomicUsize,
}

impl SlowStartTransport {
    pub fn new(silent_polls: usize) -> Self {
        Self {
            inner: LoopbackTransport::new(),
            silent_polls: AtomicUsize::new(silent_polls),
        }
    }
}

impl CoprocessorTransport for SlowStartTransport {
    fn acquire_handle(&self) -> TransportResult<Handle> {
        self.inner.acquire_handle()
    }

    fn connect(
        &self,
        handle: Handle,
        host: &Host,
        port: u16,
        mode: ConnectionMode,
    ) -> TransportResult<bool> {
        self.inner.connect(handle, host, port, mode)
    }

    fn write(&self, handle: Handle, data: &[u8]) -> TransportResult<()> {
        self.inner.write(handle, data)
    }

    fn available(&self, handle: Handle) -> TransportResult<usize> {
        let silent = self
            .silent_polls
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if silent {
            return Ok(0);
        }
        self.inner.available(handle)
    }

    fn read(&self, handle: Handle, len: usize) -> TransportResult<Bytes> {
        self.inner.read(handle, len)
    }

    fn close(&self, handle: Handle) -> TransportResult<()> {
        self.inner.close(handle)
    }

    fn resolve_host(&self, name: &str) -> TransportResult<IpAddr> {
        self.inner.resolve_host(name)
    }
}

/// Coprocessor that keeps reporting one byte available but never delivers it.
#[derive(Debug, Default)]
pub struct EmptyReadTransport {
    pub inner: LoopbackTransport,
}

impl CoprocessorTransport for EmptyReadTransport {
    fn acquire_handle(&self) -> TransportResult<Handle> {
        self.inner.acquire_handle()
    }

    fn connect(
        &self,
        handle: Handle,
        host: &Host,
        port: u16,
        mode: ConnectionMode,
    ) -> TransportResult<bool> {
        self.inner.connect(handle, host, port, mode)
    }

    fn write(&self, handle: Handle, data: &[u8]) -> TransportResult<()> {
        self.inner.write(handle, data)
    }

    fn available(&self, _handle: Handle) -> TransportResult<usize> {
        Ok(1)
    }

    fn read(&self, _handle: Handle, _len: usize) -> TransportResult<Bytes> {
        Ok(Bytes::new())
    }

    fn close(&self, handle: Handle) -> TransportResult<()> {
        self.inner.close(handle)
    }

    fn resolve_host(&self, name: &str) -> TransportResult<IpAddr> {
        self.inner.resolve_host(name)
    }
}

/// Loopback transport whose inbound bytes show up at fixed points on a manual clock.
#[derive(Debug)]
pub struct ScheduledTransport {
    pub inner: LoopbackTransport,
    clock: Arc<ManualClock>,
    arrivals: Mutex<Vec<(Duration, Vec<u8>)>>,
}

impl ScheduledTransport {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            inner: LoopbackTransport::new(),
            clock,
            arrivals: Mutex::new(Vec::new()),
        }
    }

    /// Queue `data` to arrive once the clock has reached `at`.
    pub fn arrive_at(&self, at: Duration, data: &[u8]) {
        self.arrivals.lock().push((at, data.to_vec()));
    }
}

impl CoprocessorTransport for ScheduledTransport {
    fn acquire_handle(&self) -> TransportResult<Handle> {
        self.inner.acquire_handle()
    }

    fn connect(
        &self,
        handle: Handle,
        host: &Host,
        port: u16,
        mode: ConnectionMode,
    ) -> TransportResult<bool> {
        self.inner.connect(handle, host, port, mode)
    }

    fn write(&self, handle: Handle, data: &[u8]) -> TransportResult<()> {
        self.inner.write(handle, data)
    }

    fn available(&self, handle: Handle) -> TransportResult<usize> {
        let now = self.clock.elapsed();
        let mut arrivals = self.arrivals.lock();
        let mut pending = Vec::new();
        for (at, data) in arrivals.drain(..) {
            if at <= now {
                self.inner.push_inbound(handle, &data)?;
            } else {
                pending.push((at, data));
            }
        }
        *arrivals = pending;
        drop(arrivals);
        self.inner.available(handle)
    }

    fn read(&self, handle: Handle, len: usize) -> TransportResult<Bytes> {
        self.inner.read(handle, len)
    }

    fn close(&self, handle: Handle) -> TransportResult<()> {
        self.inner.close(handle)
    }

    fn resolve_host(&self, name: &str) -> TransportResult<IpAddr> {
        self.inner.resolve_host(name)
    }
}

/// Loopback transport whose first `failures` closes report a link error.
#[derive(Debug)]
pub struct FailingCloseTransport {
    pub inner: LoopbackTransport,
    failures: AtomicUsize,
}

impl FailingCloseTransport {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: LoopbackTransport::new(),
            failures: AtomicUsize::new(failures),
        }
    }
}

impl CoprocessorTransport for FailingCloseTransport {
    fn acquire_handle(&self) -> TransportResult<Handle> {
        self.inner.acquire_handle()
    }

    fn connect(
        &self,
        handle: Handle,
        host: &Host,
        port: u16,
        mode: ConnectionMode,
    ) -> TransportResult<bool> {
        self.inner.connect(handle, host, port, mode)
    }

    fn write(&self, handle: Handle, data: &[u8]) -> TransportResult<()> {
        self.inner.write(handle, data)
    }

    fn available(&self, handle: Handle) -> TransportResult<usize> {
        self.inner.available(handle)
    }

    fn read(&self, handle: Handle, len: usize) -> TransportResult<Bytes> {
        self.inner.read(handle, len)
    }

    fn close(&self, handle: Handle) -> TransportResult<()> {
        let fail = self
            .failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(TransportError::Link("close not acknowledged".into()));
        }
        self.inner.close(handle)
    }

    fn resolve_host(&self, name: &str) -> TransportResult<IpAddr> {
        self.inner.resolve_host(name)
    }
}
