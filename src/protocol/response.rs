//! Response definitions
//!
//! Execution results and their wire text.
//!
//! ## Grammar
//! ```text
//! SUCCESS                      command applied / query with no rows
//! SUCCESS|row1|row2|...        query rows, in store order
//! ERROR: <engine message>      statement failed
//! ```
//!
//! Rows are not escaped: a row whose text contains `|` cannot be told
//! apart from two rows when the response is parsed back.

use std::fmt;

use crate::error::{RelayError, Result};

/// Token that starts every successful response
pub const SUCCESS: &str = "SUCCESS";

/// Prefix of every failed response
pub const ERROR_PREFIX: &str = "ERROR: ";

/// Separator between the success token and each row
pub const ROW_SEPARATOR: char = '|';

/// Outcome of executing one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Command ran and was committed
    Applied,

    /// Query ran; one rendered string per row
    Rows(Vec<String>),

    /// Store rejected the statement
    Failed(String),
}

/// A response as sent to (or received by) a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Success, with zero or more rows
    Success(Vec<String>),

    /// Failure with the store's message
    Error(String),
}

impl Response {
    /// Successful response without rows
    pub fn success() -> Self {
        Response::Success(Vec::new())
    }

    /// Error response
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    /// Render as wire text (without the delimiter)
    pub fn to_wire(&self) -> String {
        self.to_string()
    }

    /// Parse wire text (without the delimiter)
    ///
    /// `SUCCESS|` with an empty tail parses as one empty row, mirroring how
    /// the server would have written a single empty row string.
    pub fn parse(text: &str) -> Result<Self> {
        if let Some(message) = text.strip_prefix(ERROR_PREFIX) {
            return Ok(Response::Error(message.to_string()));
        }

        match text.strip_prefix(SUCCESS) {
            Some("") => Ok(Response::success()),
            Some(rest) => match rest.strip_prefix(ROW_SEPARATOR) {
                Some(rows) => Ok(Response::Success(
                    rows.split(ROW_SEPARATOR).map(str::to_string).collect(),
                )),
                None => Err(RelayError::Protocol(format!(
                    "Unexpected text after {}: {:?}",
                    SUCCESS, rest
                ))),
            },
            None => Err(RelayError::Protocol(format!(
                "Unrecognised response: {:?}",
                text
            ))),
        }
    }
}

impl From<ExecutionResult> for Response {
    fn from(result: ExecutionResult) -> Self {
        match result {
            ExecutionResult::Applied => Response::success(),
            ExecutionResult::Rows(rows) => Response::Success(rows),
            ExecutionResult::Failed(message) => Response::Error(message),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Success(rows) => {
                f.write_str(SUCCESS)?;
                for row in rows {
                    write!(f, "{}{}", ROW_SEPARATOR, row)?;
                }
                Ok(())
            }
            Response::Error(message) => write!(f, "{}{}", ERROR_PREFIX, message),
        }
    }
}
