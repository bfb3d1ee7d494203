//! In-memory coprocessor emulation.
//!
//! [`LoopbackTransport`] behaves like a coprocessor with a fixed pool of socket
//! slots whose inbound data is scripted by the caller. It backs the crate's tests
//! and the demo binary, and is handy for exercising protocol code without hardware.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;

use bytes::{Bytes, BytesMut};
use coprosock_transport_traits::{
    ConnectionMode, CoprocessorTransport, Handle, Host, TransportError, TransportResult,
};
use parking_lot::Mutex;
use tracing::trace;

/// Socket slots on a typical WiFi coprocessor.
const DEFAULT_SLOTS: u8 = 10;

/// Call counters, for asserting on how a socket drove the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopbackStats {
    /// Successful `acquire_handle` calls.
    pub acquired: u64,
    /// `connect` calls, successful or not.
    pub connects: u64,
    /// `read` calls.
    pub reads: u64,
    /// `close` calls.
    pub closes: u64,
    /// `resolve_host` calls.
    pub lookups: u64,
}

#[derive(Debug, Default)]
struct Slot {
    in_use: bool,
    peer: Option<(Host, u16, ConnectionMode)>,
    inbound: BytesMut,
    written: Vec<u8>,
}

#[derive(Debug, Default)]
struct LoopbackState {
    slots: Vec<Slot>,
    hosts: HashMap<String, IpAddr>,
    refused: HashSet<String>,
    chunk_limit: Option<usize>,
    stats: LoopbackStats,
}

impl LoopbackState {
    fn slot(&mut self, handle: Handle) -> TransportResult<&mut Slot> {
        self.slots
            .get_mut(usize::from(handle.get()))
            .filter(|slot| slot.in_use)
            .ok_or(TransportError::InvalidHandle(handle))
    }
}

/// A scripted, in-memory [`CoprocessorTransport`].
#[derive(Debug)]
pub struct LoopbackTransport {
    state: Mutex<LoopbackState>,
    default_mode: ConnectionMode,
}

impl LoopbackTransport {
    /// Creates a transport with ten socket slots.
    pub fn new() -> Self {
        Self::with_slots(DEFAULT_SLOTS)
    }

    /// Creates a transport with `slots` socket slots.
    pub fn with_slots(slots: u8) -> Self {
        let state = LoopbackState {
            slots: (0..slots).map(|_| Slot::default()).collect(),
            ..LoopbackState::default()
        };
        Self {
            state: Mutex::new(state),
            default_mode: ConnectionMode::Tcp,
        }
    }

    /// Registers a hostname for `resolve_host`.
    #[must_use]
    pub fn with_host(self, name: &str, ip: IpAddr) -> Self {
        self.state.lock().hosts.insert(name.to_ascii_lowercase(), ip);
        self
    }

    /// Sets the mode reported by `default_mode`.
    #[must_use]
    pub fn with_default_mode(mut self, mode: ConnectionMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Makes every future connect to `host` fail.
    pub fn refuse(&self, host: impl Into<Host>) {
        self.state.lock().refused.insert(host.into().to_string());
    }

    /// Caps how many bytes a single `available` poll reports, to emulate data
    /// trickling in. `None` reports everything queued.
    pub fn set_chunk_limit(&self, limit: Option<usize>) {
        self.state.lock().chunk_limit = limit;
    }

    /// Queues bytes as if they had arrived from the peer.
    pub fn push_inbound(&self, handle: Handle, data: &[u8]) -> TransportResult<()> {
        self.state.lock().slot(handle)?.inbound.extend_from_slice(data);
        Ok(())
    }

    /// Bytes still queued on the slot.
    pub fn pending(&self, handle: Handle) -> usize {
        let state = self.state.lock();
        state
            .slots
            .get(usize::from(handle.get()))
            .map_or(0, |slot| slot.inbound.len())
    }

    /// Everything written on the slot since it was last acquired.
    pub fn written(&self, handle: Handle) -> Vec<u8> {
        let state = self.state.lock();
        state
            .slots
            .get(usize::from(handle.get()))
            .map(|slot| slot.written.clone())
            .unwrap_or_default()
    }

    /// The last successful connect on the slot.
    pub fn peer(&self, handle: Handle) -> Option<(Host, u16, ConnectionMode)> {
        let state = self.state.lock();
        state
            .slots
            .get(usize::from(handle.get()))
            .and_then(|slot| slot.peer.clone())
    }

    /// Whether the slot is currently allocated.
    pub fn is_open(&self, handle: Handle) -> bool {
        let state = self.state.lock();
        state
            .slots
            .get(usize::from(handle.get()))
            .is_some_and(|slot| slot.in_use)
    }

    /// Number of slots currently allocated.
    pub fn open_handles(&self) -> usize {
        self.state.lock().slots.iter().filter(|slot| slot.in_use).count()
    }

    /// Call counters so far.
    pub fn stats(&self) -> LoopbackStats {
        self.state.lock().stats
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl CoprocessorTransport for LoopbackTransport {
    fn acquire_handle(&self) -> TransportResult<Handle> {
        let mut state = self.state.lock();
        let index = state
            .slots
            .iter()
            .position(|slot| !slot.in_use)
            .ok_or(TransportError::NoFreeHandles)?;
        state.slots[index] = Slot {
            in_use: true,
            ..Slot::default()
        };
        state.stats.acquired += 1;
        let handle = Handle::new(index as u8);
        trace!(%handle, "loopback slot acquired");
        Ok(handle)
    }

    fn connect(
        &self,
        handle: Handle,
        host: &Host,
        port: u16,
        mode: ConnectionMode,
    ) -> TransportResult<bool> {
        let mut state = self.state.lock();
        state.stats.connects += 1;
        let refused = state.refused.contains(&host.to_string());
        let slot = state.slot(handle)?;
        if refused {
            return Ok(false);
        }
        slot.peer = Some((host.clone(), port, mode));
        Ok(true)
    }

    fn write(&self, handle: Handle, data: &[u8]) -> TransportResult<()> {
        self.state.lock().slot(handle)?.written.extend_from_slice(data);
        Ok(())
    }

    fn available(&self, handle: Handle) -> TransportResult<usize> {
        let mut state = self.state.lock();
        let limit = state.chunk_limit;
        let queued = state.slot(handle)?.inbound.len();
        Ok(limit.map_or(queued, |limit| queued.min(limit)))
    }

    fn read(&self, handle: Handle, len: usize) -> TransportResult<Bytes> {
        let mut state = self.state.lock();
        state.stats.reads += 1;
        let slot = state.slot(handle)?;
        if len > slot.inbound.len() {
            return Err(TransportError::Link(format!(
                "read of {len} bytes exceeds the {} queued",
                slot.inbound.len()
            )));
        }
        Ok(slot.inbound.split_to(len).freeze())
    }

    fn close(&self, handle: Handle) -> TransportResult<()> {
        let mut state = self.state.lock();
        state.stats.closes += 1;
        let slot = state.slot(handle)?;
        slot.in_use = false;
        slot.inbound.clear();
        trace!(%handle, "loopback slot released");
        Ok(())
    }

    fn resolve_host(&self, name: &str) -> TransportResult<IpAddr> {
        let mut state = self.state.lock();
        state.stats.lookups += 1;
        if let Ok(ip) = name.parse::<IpAddr>() {
            return Ok(ip);
        }
        state
            .hosts
            .get(&name.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| TransportError::HostNotFound(name.to_string()))
    }

    fn default_mode(&self) -> ConnectionMode {
        self.default_mode
    }
}
