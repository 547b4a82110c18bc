//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format
//!
//! ### Request Format
//! ```text
//! ┌─────────────────────────────────┬──────┐
//! │        SQL statement (UTF-8)    │ 0x00 │
//! └─────────────────────────────────┴──────┘
//! ```
//!
//! ### Classification
//! - Trimmed text starting with `SELECT` (any case): query, rows returned
//! - Anything else: command, executed and committed
//!
//! ### Response Format
//! ```text
//! ┌─────────────────────────────────┬──────┐
//! │ SUCCESS[|row...] / ERROR: msg   │ 0x00 │
//! └─────────────────────────────────┴──────┘
//! ```

mod framer;
mod statement;
mod response;

pub use framer::{encode_message, write_message, Framer, DELIMITER, MAX_MESSAGE_SIZE, READ_CHUNK_SIZE};
pub use statement::{Statement, StatementKind};
pub use response::{ExecutionResult, Response, ERROR_PREFIX, ROW_SEPARATOR, SUCCESS};
