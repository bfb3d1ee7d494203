//! Monotonic time source for poll loops.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Source of monotonic time and of the pause between two polls.
///
/// Sockets never read the system clock directly, so timeouts can be driven by a
/// [`ManualClock`] in tests.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Pauses between two polls of the transport.
    fn sleep(&self, duration: Duration);
}

/// The process's monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(duration);
        }
    }
}

/// A clock that only moves when told to.
///
/// `sleep` advances the clock instead of blocking, by at least `tick`, so a poll
/// loop waiting on a timeout always terminates.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
    tick: Duration,
}

impl ManualClock {
    /// Creates a clock with a one millisecond minimum step per `sleep`.
    pub fn new() -> Self {
        Self::with_tick(Duration::from_millis(1))
    }

    /// Creates a clock whose `sleep` advances by at least `tick`.
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            tick,
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        *self.offset.lock() += duration;
    }

    /// Time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration.max(self.tick));
    }
}
