//! Blocking client
//!
//! Sends statements to a relay and reads back one response per statement.

use std::io::BufWriter;
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{RelayError, Result};
use crate::protocol::{write_message, Framer, Response};

/// A client connection to a relay server
pub struct Client {
    framer: Framer<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a relay server
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            framer: Framer::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Send one statement and return the raw response text
    pub fn send(&mut self, sql: &str) -> Result<String> {
        write_message(&mut self.writer, sql)?;
        self.framer.next_message()?.ok_or_else(|| {
            RelayError::Network("connection closed before a response was received".to_string())
        })
    }

    /// Send one statement and parse the response
    pub fn execute(&mut self, sql: &str) -> Result<Response> {
        let text = self.send(sql)?;
        Response::parse(&text)
    }
}
