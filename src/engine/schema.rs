//! Schema setup
//!
//! Creates the relay's tables once, before the listener starts. Statements
//! arriving over the wire are never checked against this schema.

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

/// Tables created at startup, in dependency order
pub const TABLES: [&str; 3] = ["users", "login_history", "file_tracking"];

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        username TEXT PRIMARY KEY,
        password TEXT NOT NULL,
        registration_date TEXT
    );

    CREATE TABLE IF NOT EXISTS login_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL,
        login_time TEXT NOT NULL,
        logout_time TEXT,
        FOREIGN KEY(username) REFERENCES users(username)
    );

    CREATE TABLE IF NOT EXISTS file_tracking (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        username TEXT NOT NULL,
        upload_time TEXT,
        game_channel TEXT,
        FOREIGN KEY(username) REFERENCES users(username)
    );
";

/// Create any missing tables (idempotent)
pub fn init_schema(path: &Path) -> Result<()> {
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;
    tx.commit()?;
    Ok(())
}
