//! Statement classification
//!
//! Decides whether an incoming message is a query or a command.

/// Keyword that marks a row-returning statement
const QUERY_KEYWORD: &str = "SELECT";

/// How a statement is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Returns rows
    Query,

    /// Mutates state, returns success or failure only
    Command,
}

impl StatementKind {
    /// Classify SQL text
    ///
    /// A statement is a query iff, after trimming whitespace, it starts with
    /// `SELECT` in any case. Nothing else about the text is inspected.
    pub fn classify(sql: &str) -> Self {
        if sql.trim().to_uppercase().starts_with(QUERY_KEYWORD) {
            StatementKind::Query
        } else {
            StatementKind::Command
        }
    }
}

/// A classified statement, text kept exactly as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        Self {
            kind: StatementKind::classify(&sql),
            sql,
        }
    }

    pub fn is_query(&self) -> bool {
        self.kind == StatementKind::Query
    }
}
