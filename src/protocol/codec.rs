//! Line codec
//!
//! CRLF framing over a raw byte stream.
//!
//! A single `read` may return less than a line, exactly one line, or a line
//! plus the start of the next. `LineBuffer` keeps the unconsumed bytes in a
//! fixed-capacity window between calls:
//!
//! ```text
//!   ┌──────────────── capacity ────────────────┐
//!   │ leftover from last read │ next read ...  │
//!   └─────────────────────────┴────────────────┘
//! ```

use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::error::{Result, UndisError};

/// Per-connection line buffer
pub struct LineBuffer {
    /// Bytes received but not yet returned as a line
    buffer: BytesMut,

    /// Longest line (including CRLF) the buffer can hold
    capacity: usize,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Read the next line, without its CRLF
    ///
    /// Returns:
    /// - `Ok(Some(line))` — a complete line
    /// - `Ok(None)` — the peer closed the stream
    /// - `Err(ClientData)` — the buffer filled up without a line terminator
    /// - `Err(Io)` — the read failed
    pub fn read_line<R: Read>(&mut self, reader: &mut R) -> Result<Option<BytesMut>> {
        loop {
            if let Some(pos) = find_crlf(&self.buffer) {
                let line = self.buffer.split_to(pos);
                self.buffer.advance(2);
                return Ok(Some(line));
            }

            let filled = self.buffer.len();
            if filled >= self.capacity {
                return Err(UndisError::ClientData("line too long".to_string()));
            }

            self.buffer.resize(self.capacity, 0);
            let read = reader.read(&mut self.buffer[filled..]);
            match read {
                Ok(0) => {
                    self.buffer.truncate(filled);
                    return Ok(None);
                }
                Ok(n) => self.buffer.truncate(filled + n),
                Err(e) if e.kind() == ErrorKind::Interrupted => self.buffer.truncate(filled),
                Err(e) => {
                    self.buffer.truncate(filled);
                    return Err(e.into());
                }
            }
        }
    }

    /// Bytes carried over to the next `read_line`
    pub fn leftover(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn find_crlf(bytes: &[u8]) -> Option<usize> {
    bytes.windows(2).position(|w| w == b"\r\n")
}
