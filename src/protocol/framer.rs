//! Message framing
//!
//! Splits a byte stream into null-terminated UTF-8 messages.
//!
//! ## Wire Format
//!
//! ```text
//! ┌─────────────────────────────────┬──────┐
//! │        UTF-8 text (any len)     │ 0x00 │
//! └─────────────────────────────────┴──────┘
//! ```
//!
//! The same framing is used in both directions. There is no length prefix
//! and no header.
//!
//! ## Buffering
//! Bytes that follow a delimiter stay in the buffer and are returned by the
//! next call, so a client that pipelines several requests in one write gets
//! every one of them answered, in order.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BytesMut};

use crate::error::{RelayError, Result};

/// Byte that ends every message
pub const DELIMITER: u8 = 0x00;

/// Size of a single socket read
pub const READ_CHUNK_SIZE: usize = 1024;

/// Default upper bound for one buffered, unterminated message (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Pulls delimited messages out of a byte source
pub struct Framer<R> {
    /// Underlying byte source
    reader: R,

    /// Bytes received but not yet returned as a message
    buffer: BytesMut,

    /// Largest unterminated message tolerated
    max_message_size: usize,
}

impl<R: Read> Framer<R> {
    /// Create a framer with the default message size limit
    pub fn new(reader: R) -> Self {
        Self::with_max_message_size(reader, MAX_MESSAGE_SIZE)
    }

    /// Create a framer that rejects messages larger than `max_message_size`
    pub fn with_max_message_size(reader: R, max_message_size: usize) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            max_message_size,
        }
    }

    /// Read the next message
    ///
    /// Blocks until a full message is buffered. Returns `Ok(None)` once the
    /// source reaches end-of-stream; any unterminated bytes left at that
    /// point are dropped. Invalid UTF-8 is replaced, never rejected.
    pub fn next_message(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(message) = self.take_buffered() {
                return Ok(Some(message));
            }

            if self.buffer.len() > self.max_message_size {
                return Err(RelayError::Protocol(format!(
                    "Message too large: more than {} bytes without a delimiter",
                    self.max_message_size
                )));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let n = match self.reader.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if n == 0 {
                if !self.buffer.is_empty() {
                    tracing::trace!(
                        "Dropping {} unterminated bytes at end of stream",
                        self.buffer.len()
                    );
                    self.buffer.clear();
                }
                return Ok(None);
            }

            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Number of bytes buffered but not yet returned
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Get a reference to the underlying source
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Split off the first complete message, if any
    fn take_buffered(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == DELIMITER)?;
        let frame = self.buffer.split_to(pos);
        self.buffer.advance(1);
        Some(String::from_utf8_lossy(&frame).into_owned())
    }
}

impl<R: Read> Iterator for Framer<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message().transpose()
    }
}

/// Encode a message as wire bytes (text + delimiter)
pub fn encode_message(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(DELIMITER);
    bytes
}

/// Write one message followed by the delimiter and flush
pub fn write_message<W: Write>(writer: &mut W, text: &str) -> Result<()> {
    writer.write_all(&encode_message(text))?;
    writer.flush()?;
    Ok(())
}
