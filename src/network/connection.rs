//! Connection Handler
//!
//! Handles individual client connections.
//!
//! ## Lifecycle
//! ```text
//! CONNECTED → { AWAITING_MESSAGE → PROCESSING → RESPONDING }* → CLOSED
//! ```
//! End-of-stream, an empty message, or any transport error moves straight
//! to CLOSED. Statement failures do not: they are answered with `ERROR: ...`
//! and the loop continues.

use std::io::BufWriter;
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{write_message, Framer, Response, Statement};

/// Handles a single client connection
pub struct Connection {
    /// Framed reader over the TCP stream
    framer: Framer<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the statement executor
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up framed reads and buffered writes
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;
        let max_message_size = engine.config().max_message_size;

        Ok(Self {
            framer: Framer::with_max_message_size(read_stream, max_message_size),
            writer: BufWriter::new(write_stream),
            engine,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves a direction without one)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.framer
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Serve the connection until it closes, then release the socket
    ///
    /// Transport errors end this connection only and are logged here rather
    /// than returned.
    pub fn run(mut self) {
        tracing::info!("Client connected from {}", self.peer_addr);

        if let Err(e) = self.handle() {
            if e.is_disconnect() {
                tracing::debug!("Client {} dropped: {}", self.peer_addr, e);
            } else {
                tracing::warn!("Error handling client {}: {}", self.peer_addr, e);
            }
        }

        self.close();
        tracing::info!("Client {} disconnected", self.peer_addr);
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads one message, executes it, writes one response, repeat.
    /// Returns `Ok(())` on a clean close.
    pub fn handle(&mut self) -> Result<()> {
        loop {
            let message = match self.framer.next_message()? {
                Some(message) if !message.is_empty() => message,
                Some(_) => {
                    tracing::debug!("Empty message from {}, closing", self.peer_addr);
                    return Ok(());
                }
                None => return Ok(()),
            };

            tracing::debug!("Received SQL from {}: {}", self.peer_addr, message);

            let statement = Statement::new(message);
            let response = Response::from(self.engine.execute(&statement));

            tracing::trace!("Responding to {}: {}", self.peer_addr, response);
            write_message(&mut self.writer, &response.to_wire())?;
        }
    }

    /// Shut the socket down; failures on an already broken socket are ignored
    fn close(&mut self) {
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
