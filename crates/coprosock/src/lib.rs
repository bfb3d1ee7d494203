//! # coprosock
//!
//! Blocking stream sockets for networking coprocessors that only offer primitive,
//! polling-based byte transport (an available-byte count, bounded reads, raw writes).
//! Protocol code written against an ordinary socket API can run unchanged over such
//! a link.
//!
//! ## Features
//!
//! - **Explicit transport injection**: a [`SocketFactory`] owns the
//!   [`CoprocessorTransport`] and hands out sockets, no global interface binding
//! - **Buffered reads**: drain, sized and CRLF line reads over one FIFO receive buffer
//! - **Two timeouts**: a fixed stall bound for sized reads (short read, no error) and a
//!   caller timeout for line reads (socket closed, [`SocketError::ReadTimeout`])
//! - **Lifecycle state machine**: every operation on a closed socket is rejected
//! - **Injectable clock**: [`MonotonicClock`] in production, [`ManualClock`] in tests
//! - **Loopback transport**: [`LoopbackTransport`] emulates a coprocessor in memory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use coprosock::{AddrInfoHints, SocketFactory};
//!
//! let factory = SocketFactory::new(Arc::new(my_coprocessor));
//! let info = factory.getaddrinfo("example.com", 80, AddrInfoHints::default())?;
//!
//! let mut socket = factory.stream()?;
//! socket.connect(info[0].addr, None)?;
//! socket.write(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n")?;
//! let status = socket.readline()?;
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod buffer;
mod clock;
mod config;
mod error;
mod logging;
mod loopback;
mod resolver;
mod socket;
mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ConfigError, SocketConfig};
pub use error::{SocketError, SocketResult};
pub use logging::{LogOutput, LoggingConfig};
pub use loopback::{LoopbackStats, LoopbackTransport};
pub use resolver::{AddrInfo, AddrInfoHints, Service, getaddrinfo};
pub use socket::{SocketFactory, StreamSocket};
pub use types::{AddressFamily, SocketState, SocketType};

// Re-export transport traits for convenience
pub use coprosock_transport_traits::{
    ConnectionMode, CoprocessorTransport, Handle, Host, LinkMetrics, LinkMetricsSnapshot,
    RemoteAddr, TransportError, TransportResult,
};
