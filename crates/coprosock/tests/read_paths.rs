//! Drain, sized and line reads, including both timeout paths

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{EmptyReadTransport, POLL, ScheduledTransport, SlowStartTransport, fixture};
use coprosock::{
    LoopbackTransport, ManualClock, SocketConfig, SocketError, SocketFactory, SocketState,
};
use pretty_assertions::assert_eq;

#[test]
fn test_drain_returns_everything_queued_without_waiting() {
    let fx = fixture();
    let mut socket = fx.factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();

    let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    fx.transport.push_inbound(socket.handle(), &payload).unwrap();

    let data = socket.read(0).unwrap();
    assert_eq!(data.len(), payload.len());
    assert_eq!(&data[..], &payload[..]);
    assert_eq!(socket.buffered_len(), 0);
    // 4000 + 4000 + 2000
    assert_eq!(fx.transport.stats().reads, 3);
    assert_eq!(fx.clock.elapsed(), Duration::ZERO);
}

#[test]
fn test_drain_with_nothing_queued_is_empty() {
    let fx = fixture();
    let mut socket = fx.factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();

    assert!(socket.read(0).unwrap().is_empty());
    assert_eq!(fx.clock.elapsed(), Duration::ZERO);
}

#[test]
fn test_drain_stops_at_first_empty_poll() {
    let transport = Arc::new(SlowStartTransport::new(1));
    let factory = SocketFactory::new(transport.clone());
    let mut socket = factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    transport.inner.push_inbound(socket.handle(), b"late").unwrap();

    assert!(socket.read(0).unwrap().is_empty());
    assert_eq!(&socket.read(0).unwrap()[..], b"late");
}

#[test]
fn test_sized_read_respects_max_packet() {
    let transport = Arc::new(LoopbackTransport::new());
    let factory = SocketFactory::new(transport.clone())
        .with_config(SocketConfig::default().with_max_packet(16));
    let mut socket = factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    transport.push_inbound(socket.handle(), &[7u8; 50]).unwrap();

    let data = socket.read(40).unwrap();
    assert_eq!(data.len(), 40);
    // 16 + 16 + 8, never more than still missing
    assert_eq!(transport.stats().reads, 3);
    assert_eq!(transport.pending(socket.handle()), 10);
}

#[test]
fn test_sized_read_assembles_trickled_bytes() {
    let fx = fixture();
    fx.transport.set_chunk_limit(Some(3));
    let mut socket = fx.factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    fx.transport
        .push_inbound(socket.handle(), b"0123456789abcdef")
        .unwrap();

    assert_eq!(&socket.read(10).unwrap()[..], b"0123456789");
    assert_eq!(&socket.read(0).unwrap()[..], b"abcdef");
}

#[test]
fn test_sized_read_waits_through_short_silence() {
    let transport = Arc::new(SlowStartTransport::new(20));
    let clock = Arc::new(ManualClock::new());
    let factory = SocketFactory::new(transport.clone())
        .with_clock(clock.clone())
        .with_config(SocketConfig::default().with_poll_interval(POLL));
    let mut socket = factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    transport.inner.push_inbound(socket.handle(), b"hello").unwrap();

    assert_eq!(&socket.read(5).unwrap()[..], b"hello");
    assert_eq!(clock.elapsed(), POLL * 20);
    assert_eq!(factory.metrics().snapshot().short_reads, 0);
}

#[test]
fn test_sized_read_short_after_stall_bound() {
    let fx = fixture();
    let mut socket = fx.factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    fx.transport.push_inbound(socket.handle(), b"abc").unwrap();

    let data = socket.read(10).unwrap();
    assert_eq!(&data[..], b"abc");
    assert_eq!(socket.buffered_len(), 0);
    assert_eq!(socket.state(), SocketState::Connected);

    // The stall bound is independent of the line timeout
    let elapsed = fx.clock.elapsed();
    assert!(elapsed > Duration::from_secs(8));
    assert!(elapsed <= Duration::from_secs(8) + POLL);
}

#[test]
fn test_stall_bound_restarts_on_progress() {
    let clock = Arc::new(ManualClock::new());
    let transport = Arc::new(ScheduledTransport::new(clock.clone()));
    let factory = SocketFactory::new(transport.clone())
        .with_clock(clock.clone())
        .with_config(SocketConfig::default().with_poll_interval(POLL));
    let mut socket = factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();

    // Every gap is below the 8s stall bound, the whole read is not
    transport.arrive_at(Duration::from_secs(7), b"abc");
    transport.arrive_at(Duration::from_secs(14), b"defg");
    transport.arrive_at(Duration::from_secs(21), b"hij");

    assert_eq!(&socket.read(10).unwrap()[..], b"abcdefghij");
    assert!(clock.elapsed() >= Duration::from_secs(21));
    assert_eq!(factory.metrics().snapshot().short_reads, 0);
}

#[test]
fn test_stall_bound_is_configurable() {
    let fx = fixture();
    let factory = fx
        .factory
        .clone()
        .with_config(
            SocketConfig::default()
                .with_poll_interval(POLL)
                .with_stall_timeout(Duration::from_millis(500)),
        );
    let mut socket = factory.stream().unwrap();
    socket.set_timeout(Some(Duration::from_secs(60))).unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();

    assert!(socket.read(4).unwrap().is_empty());
    assert!(fx.clock.elapsed() <= Duration::from_millis(500) + POLL);
}

#[test]
fn test_readline_sequence() {
    let fx = fixture();
    let mut socket = fx.factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    fx.transport
        .push_inbound(
            socket.handle(),
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello",
        )
        .unwrap();

    assert_eq!(&socket.readline().unwrap()[..], b"HTTP/1.1 200 OK");
    assert_eq!(&socket.readline().unwrap()[..], b"Content-Length: 5");
    assert_eq!(&socket.readline().unwrap()[..], b"");
    assert_eq!(&socket.read(5).unwrap()[..], b"hello");
}

#[test]
fn test_readline_blocks_without_timeout() {
    let transport = Arc::new(SlowStartTransport::new(1_000));
    let clock = Arc::new(ManualClock::new());
    let factory = SocketFactory::new(transport.clone())
        .with_clock(clock.clone())
        .with_config(SocketConfig::default().with_poll_interval(POLL));
    let mut socket = factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    transport.inner.push_inbound(socket.handle(), b"eventually\r\n").unwrap();

    assert_eq!(&socket.readline().unwrap()[..], b"eventually");
    assert_eq!(clock.elapsed(), POLL * 1_000);
}

#[test]
fn test_readline_timeout_closes_and_fails() {
    let fx = fixture();
    let mut socket = fx.factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    socket.set_timeout(Some(Duration::from_secs(2))).unwrap();

    let err = socket.readline().unwrap_err();
    assert_eq!(
        err,
        SocketError::ReadTimeout {
            timeout: Duration::from_secs(2)
        }
    );
    assert!(err.is_fatal());
    assert!(fx.clock.elapsed() > Duration::from_secs(2));
    assert_eq!(fx.transport.stats().closes, 1);
    assert_eq!(socket.state(), SocketState::Closed);
    assert_eq!(socket.readline(), Err(SocketError::Closed));
    assert_eq!(fx.factory.metrics().snapshot().read_timeouts, 1);
}

#[test]
fn test_readline_timeout_returns_no_partial_line() {
    let fx = fixture();
    let mut socket = fx.factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    socket.set_timeout(Some(Duration::from_secs(1))).unwrap();
    fx.transport
        .push_inbound(socket.handle(), b"no terminator")
        .unwrap();

    assert!(matches!(
        socket.readline(),
        Err(SocketError::ReadTimeout { .. })
    ));
    assert_eq!(socket.buffered_len(), b"no terminator".len());
}

#[test]
fn test_default_timeout_from_config() {
    let fx = fixture();
    let factory = fx.factory.clone().with_config(
        SocketConfig::default()
            .with_poll_interval(POLL)
            .with_default_timeout(Some(Duration::from_secs(3))),
    );
    let mut socket = factory.stream().unwrap();
    assert_eq!(socket.timeout(), Some(Duration::from_secs(3)));
    socket.connect(("10.0.0.1", 80), None).unwrap();

    assert!(matches!(
        socket.readline(),
        Err(SocketError::ReadTimeout { timeout }) if timeout == Duration::from_secs(3)
    ));
}

#[test]
fn test_readline_timeout_with_empty_transport_reads() {
    let transport = Arc::new(EmptyReadTransport::default());
    let clock = Arc::new(ManualClock::new());
    let factory = SocketFactory::new(transport.clone())
        .with_clock(clock.clone())
        .with_config(SocketConfig::default().with_poll_interval(POLL));
    let mut socket = factory.stream().unwrap();
    socket.connect(("10.0.0.1", 80), None).unwrap();
    socket.set_timeout(Some(Duration::from_secs(2))).unwrap();

    assert_eq!(
        socket.readline(),
        Err(SocketError::ReadTimeout {
            timeout: Duration::from_secs(2)
        })
    );
    assert!(clock.elapsed() > Duration::from_secs(2));
    assert_eq!(socket.state(), SocketState::Closed);
    assert_eq!(transport.inner.stats().closes, 1);
}
