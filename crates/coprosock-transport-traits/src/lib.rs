//! # coprosock transport traits
//!
//! The primitive operations a networking coprocessor exposes, and the small set of
//! types they exchange. Socket implementations depend on this crate and drive any
//! [`CoprocessorTransport`] implementation.
//!
//! ## Overview
//!
//! This crate defines:
//! - **Traits**: [`CoprocessorTransport`]
//! - **Types**: [`Handle`], [`ConnectionMode`], [`Host`], [`RemoteAddr`]
//! - **Errors**: [`TransportError`], [`TransportResult`]
//! - **Metrics**: [`LinkMetrics`], [`LinkMetricsSnapshot`]
//!
//! ## Usage
//!
//! A coprocessor driver implements the trait over whatever bus it speaks:
//!
//! ```rust,ignore
//! use coprosock_transport_traits::{CoprocessorTransport, Handle, TransportResult};
//!
//! #[derive(Debug)]
//! struct SpiCoprocessor { /* bus, chip-select, ready pin ... */ }
//!
//! impl CoprocessorTransport for SpiCoprocessor {
//!     fn acquire_handle(&self) -> TransportResult<Handle> { /* ... */ }
//!     // ... other primitives
//! }
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

mod error;
mod metrics;
mod traits;
mod types;

pub use error::{TransportError, TransportResult};
pub use metrics::{LinkMetrics, LinkMetricsSnapshot};
pub use traits::CoprocessorTransport;
pub use types::{ConnectionMode, Handle, Host, RemoteAddr};
