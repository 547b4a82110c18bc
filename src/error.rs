//! Error types for SqlRelay
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

/// Unified error type for SqlRelay operations
#[derive(Debug, Error)]
pub enum RelayError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("You can only execute one statement at a time.")]
    MultipleStatements,

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Message reported to clients for a failed statement
    ///
    /// Store errors carry the engine's own text, without the crate prefix.
    pub fn statement_message(&self) -> String {
        match self {
            RelayError::Sql(e) => e.to_string(),
            other => other.to_string(),
        }
    }

    /// True for errors that just mean the peer went away
    ///
    /// These end a connection quietly instead of being reported as failures.
    pub fn is_disconnect(&self) -> bool {
        match self {
            RelayError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
