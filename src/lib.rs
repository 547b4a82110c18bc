//! # SqlRelay
//!
//! A small TCP relay that lets a remote client run SQL against a SQLite file
//! without a SQL client library:
//! - Requests and responses are UTF-8 text terminated by a `0x00` byte
//! - `SELECT ...` returns rows, anything else is executed and committed
//! - One handler thread per client connection
//! - One short-lived store connection per request
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one thread per connection
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Connection Handler                           │
//! │        Framer → Statement → Engine → Response                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌───────────────┐
//!               │    SQLite     │
//!               │ (fresh conn / │
//!               │   request)    │
//!               └───────────────┘
//! ```
//!
//! Statement text is passed to SQLite unmodified. The relay performs no
//! authentication, encryption, or sanitization.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod engine;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RelayError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SqlRelay
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
