//! Bounded, length-tracked message buffer.
//!
//! The server reads the TCP byte stream into a single fixed-capacity buffer
//! and splits newline-terminated lines off the front of it. The valid length
//! is always explicit, so a short line following a long one can never pick
//! up stale bytes from the previous read.
//!
//! A buffer that fills up without a newline is handed out whole as one
//! message, which bounds every message to the buffer capacity.

use bytes::{Bytes, BytesMut};
use std::io::{self, Read};

/// Fixed-capacity receive buffer.
#[derive(Debug)]
pub struct MessageBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl MessageBuffer {
    /// Create a buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "buffer capacity must be non-zero");
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of valid bytes currently buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() >= self.capacity
    }

    /// Perform one read from `reader` into the spare capacity.
    ///
    /// Returns the number of bytes read; `0` means the peer closed the
    /// stream. Callers must drain complete messages with
    /// [`next_message`](Self::next_message) before filling again, so the
    /// buffer is never full here.
    pub fn fill<R: Read>(&mut self, reader: &mut R) -> io::Result<usize> {
        debug_assert!(!self.is_full(), "fill called on a full buffer");

        let start = self.len();
        self.buf.resize(self.capacity, 0);

        loop {
            match reader.read(&mut self.buf[start..]) {
                Ok(n) => {
                    self.buf.truncate(start + n);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(e);
                }
            }
        }
    }

    /// Split the next message off the front of the buffer.
    ///
    /// Yields a complete line including its `\n`, or the whole buffer when
    /// it is full and holds no newline. Returns `None` when more data is
    /// needed.
    pub fn next_message(&mut self) -> Option<Bytes> {
        if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            return Some(self.buf.split_to(pos + 1).freeze());
        }
        if self.is_full() {
            return Some(self.buf.split().freeze());
        }
        None
    }

    /// Take whatever partial line is left, e.g. after the peer closed.
    pub fn take_remainder(&mut self) -> Option<Bytes> {
        if self.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }
}
