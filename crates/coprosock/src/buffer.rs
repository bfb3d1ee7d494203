//! FIFO receive buffer shared by the socket read paths.

use bytes::{Buf, Bytes, BytesMut};

const CRLF: &[u8; 2] = b"\r\n";

/// Capacity kept across a release point; anything larger is handed back to the
/// allocator once the buffer is empty.
const RETAINED_CAPACITY: usize = 4096;

/// Append-at-tail, consume-at-head byte queue.
#[derive(Debug, Default)]
pub(crate) struct ReceiveBuffer {
    bytes: BytesMut,
}

impl ReceiveBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn extend(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Position of the first CRLF at or after `from`.
    pub(crate) fn find_crlf(&self, from: usize) -> Option<usize> {
        let from = from.min(self.bytes.len());
        self.bytes[from..]
            .windows(CRLF.len())
            .position(|window| window == CRLF)
            .map(|pos| from + pos)
    }

    /// Removes the line ending at `crlf` together with its delimiter and returns the
    /// line without it.
    pub(crate) fn take_line(&mut self, crlf: usize) -> Bytes {
        let line = self.bytes.split_to(crlf).freeze();
        self.bytes.advance(CRLF.len());
        line
    }

    /// Removes and returns up to `n` bytes from the head.
    pub(crate) fn take_prefix(&mut self, n: usize) -> Bytes {
        let n = n.min(self.bytes.len());
        self.bytes.split_to(n).freeze()
    }

    /// Removes and returns everything.
    pub(crate) fn take_all(&mut self) -> Bytes {
        self.bytes.split().freeze()
    }

    pub(crate) fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Advisory release point: drops oversized spare capacity once nothing is
    /// buffered. Contents are never touched.
    pub(crate) fn release(&mut self) {
        if self.bytes.is_empty() && self.bytes.capacity() > RETAINED_CAPACITY {
            self.bytes = BytesMut::new();
        }
    }

    #[cfg(test)]
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}
