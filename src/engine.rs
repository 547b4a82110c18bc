//! Engine Module
//!
//! Executes classified statements against the SQLite store.
//!
//! ## Responsibilities
//! - Create the schema once on startup
//! - Run commands in autocommit mode (each statement is atomic)
//! - Run queries and render every row as text
//! - Turn store failures into `ExecutionResult::Failed`
//! - Reject messages holding more than one statement
//!
//! ## Connection Model
//! Every execution opens its own store connection and drops it before
//! returning, on success and on failure alike. Nothing is pooled or shared
//! between requests. Concurrent writers are serialized by SQLite itself,
//! waiting up to `busy_timeout_ms`.
//!
//! Statement text is executed exactly as received. There is no sanitization
//! layer: anyone who can reach the socket can run arbitrary SQL.

mod row;
mod schema;

use std::fs;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Batch, Connection, Statement as StoreStatement};

use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::protocol::{ExecutionResult, Statement, StatementKind};

pub use row::{render_row, render_value};
pub use schema::{init_schema, TABLES};

/// The statement executor
pub struct Engine {
    /// Engine configuration
    config: Config,
}

impl Engine {
    /// Open the engine with the given config
    ///
    /// On startup:
    /// 1. Create the database's parent directory if needed
    /// 2. Create any missing tables
    /// 3. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        init_schema(&config.db_path)?;
        tracing::info!(
            "[{}] Database initialized at {}",
            config.server_name,
            config.db_path.display()
        );

        Ok(Self { config })
    }

    /// Execute a classified statement
    pub fn execute(&self, statement: &Statement) -> ExecutionResult {
        match statement.kind {
            StatementKind::Query => self.execute_query(&statement.sql),
            StatementKind::Command => self.execute_command(&statement.sql),
        }
    }

    /// Execute a data-modifying statement and commit it
    ///
    /// Text holding no statement at all (whitespace, comments) is applied
    /// as a no-op.
    pub fn execute_command(&self, sql: &str) -> ExecutionResult {
        match self.run_command(sql) {
            Ok(()) => ExecutionResult::Applied,
            Err(e) => {
                tracing::debug!("Command failed: {}", e);
                ExecutionResult::Failed(e.statement_message())
            }
        }
    }

    /// Execute a row-returning statement
    pub fn execute_query(&self, sql: &str) -> ExecutionResult {
        match self.run_query(sql) {
            Ok(rows) => ExecutionResult::Rows(rows),
            Err(e) => {
                tracing::debug!("Query failed: {}", e);
                ExecutionResult::Failed(e.statement_message())
            }
        }
    }

    /// Get the engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the database file path
    pub fn db_path(&self) -> &Path {
        &self.config.db_path
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Open a fresh store connection for one execution
    fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.config.db_path)?;
        conn.busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))?;
        Ok(conn)
    }

    fn run_command(&self, sql: &str) -> Result<()> {
        let conn = self.connect()?;
        if let Some(mut stmt) = prepare_single(&conn, sql)? {
            // Row-yielding commands (PRAGMA, RETURNING) are drained to completion.
            let mut rows = stmt.query([])?;
            while rows.next()?.is_some() {}
        }
        // A transaction opened by the statement itself (BEGIN) is committed
        // before the connection is released.
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn run_query(&self, sql: &str) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt = match prepare_single(&conn, sql)? {
            Some(stmt) => stmt,
            None => return Ok(Vec::new()),
        };
        let columns = stmt.column_count();

        let mut rendered = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let values = (0..columns)
                .map(|i| row.get_ref(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rendered.push(render_row(&values));
        }
        Ok(rendered)
    }
}

/// Compile `sql` as at most one statement
///
/// Returns `None` when the text holds only whitespace or comments. Anything
/// after the first statement other than whitespace or comments is rejected
/// before the first one runs.
fn prepare_single<'conn>(
    conn: &'conn Connection,
    sql: &str,
) -> Result<Option<StoreStatement<'conn>>> {
    let mut batch = Batch::new(conn, sql);
    let first = match batch.next()? {
        Some(stmt) => stmt,
        None => return Ok(None),
    };
    match batch.next() {
        Ok(None) => Ok(Some(first)),
        Ok(Some(_)) | Err(_) => Err(RelayError::MultipleStatements),
    }
}
