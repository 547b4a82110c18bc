//! Configuration for SqlRelay
//!
//! Centralized configuration with sensible defaults. Built once at startup
//! and shared read-only by the listener and the engine.

use std::path::PathBuf;

use crate::error::{RelayError, Result};

/// Default TCP port the relay listens on
pub const DEFAULT_PORT: u16 = 7778;

/// Default host the relay binds to (loopback only)
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Main configuration for a SqlRelay instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// SQLite database file. Every request opens its own connection to it.
    pub db_path: PathBuf,

    /// How long a store connection waits on a locked database (milliseconds)
    pub busy_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Label used in log output
    pub server_name: String,

    /// Max concurrent client connections (0 = unbounded)
    pub max_connections: usize,

    /// Largest request accepted before a delimiter is seen (bytes)
    pub max_message_size: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("sqlrelay.db"),
            busy_timeout_ms: 5000,
            listen_addr: format!("{}:{}", DEFAULT_HOST, DEFAULT_PORT),
            server_name: "SQL_RELAY_SERVER".to_string(),
            max_connections: 0,
            max_message_size: 16 * 1024 * 1024, // 16 MB
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(RelayError::Config("db_path must not be empty".to_string()));
        }
        if self.listen_addr.is_empty() {
            return Err(RelayError::Config("listen_addr must not be empty".to_string()));
        }
        if self.max_message_size == 0 {
            return Err(RelayError::Config(
                "max_message_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the SQLite database file
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the store busy timeout (in milliseconds)
    pub fn busy_timeout_ms(mut self, ms: u64) -> Self {
        self.config.busy_timeout_ms = ms;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the label used in log output
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.config.server_name = name.into();
        self
    }

    /// Set the maximum number of concurrent connections (0 = unbounded)
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the maximum size of a single request (in bytes)
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
