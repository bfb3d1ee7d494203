//! Link metrics types.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// A serializable snapshot of socket-level traffic over a coprocessor link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetricsSnapshot {
    /// Total number of bytes handed to the transport.
    pub bytes_sent: u64,

    /// Total number of bytes read from the transport.
    pub bytes_received: u64,

    /// Total number of connect attempts.
    pub connect_attempts: u64,

    /// Connect attempts the coprocessor refused.
    pub failed_connects: u64,

    /// Sized reads cut short by the stall bound.
    pub short_reads: u64,

    /// Line reads that hit the caller's timeout.
    pub read_timeouts: u64,
}

/// Lock-free counters, shared between the sockets of one link.
#[derive(Debug, Default)]
pub struct LinkMetrics {
    /// Total bytes sent (atomic counter).
    pub bytes_sent: AtomicU64,

    /// Total bytes received (atomic counter).
    pub bytes_received: AtomicU64,

    /// Connect attempts (atomic counter).
    pub connect_attempts: AtomicU64,

    /// Refused connects (atomic counter).
    pub failed_connects: AtomicU64,

    /// Short sized reads (atomic counter).
    pub short_reads: AtomicU64,

    /// Line read timeouts (atomic counter).
    pub read_timeouts: AtomicU64,
}

impl LinkMetrics {
    /// Creates a new `LinkMetrics` instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `n` to the sent byte counter.
    pub fn record_sent(&self, n: usize) {
        self.bytes_sent.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Adds `n` to the received byte counter.
    pub fn record_received(&self, n: usize) {
        self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Creates a serializable snapshot from the current atomic values.
    pub fn snapshot(&self) -> LinkMetricsSnapshot {
        LinkMetricsSnapshot {
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            failed_connects: self.failed_connects.load(Ordering::Relaxed),
            short_reads: self.short_reads.load(Ordering::Relaxed),
            read_timeouts: self.read_timeouts.load(Ordering::Relaxed),
        }
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.bytes_sent.store(0, Ordering::Relaxed);
        self.bytes_received.store(0, Ordering::Relaxed);
        self.connect_attempts.store(0, Ordering::Relaxed);
        self.failed_connects.store(0, Ordering::Relaxed);
        self.short_reads.store(0, Ordering::Relaxed);
        self.read_timeouts.store(0, Ordering::Relaxed);
    }
}
