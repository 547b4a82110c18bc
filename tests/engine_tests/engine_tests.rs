//! Tests for Engine
//!
//! These tests verify:
//! - Schema creation on open
//! - Command execution and commit
//! - Query execution and row rendering
//! - Failures reported as data, store left unchanged
//! - Concurrent access from several threads

use std::sync::Arc;
use std::thread;

use sqlrelay::config::Config;
use sqlrelay::engine::{Engine, TABLES};
use sqlrelay::protocol::{ExecutionResult, Statement};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .db_path(temp_dir.path().join("relay.db"))
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn insert_user(engine: &Engine, name: &str) -> ExecutionResult {
    engine.execute_command(&format!(
        "INSERT INTO users (username, password, registration_date) VALUES ('{}', 'pw', '2024-01-01')",
        name
    ))
}

fn rows(result: ExecutionResult) -> Vec<String> {
    match result {
        ExecutionResult::Rows(rows) => rows,
        other => panic!("Expected rows, got {:?}", other),
    }
}

fn failure(result: ExecutionResult) -> String {
    match result {
        ExecutionResult::Failed(message) => message,
        other => panic!("Expected failure, got {:?}", other),
    }
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_schema() {
    let (_temp, engine) = setup_temp_engine();

    assert!(engine.db_path().exists());
    let tables = rows(engine.execute_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    ));
    assert_eq!(
        tables,
        vec!["('file_tracking',)", "('login_history',)", "('users',)"]
    );
    assert_eq!(TABLES.len(), 3);
}

#[test]
fn test_engine_open_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("dir").join("relay.db");

    let config = Config::builder().db_path(&db_path).build();
    let engine = Engine::open(config).unwrap();

    assert!(db_path.exists());
    assert_eq!(engine.db_path(), db_path.as_path());
}

#[test]
fn test_engine_reopen_keeps_data() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .db_path(temp_dir.path().join("relay.db"))
        .build();

    {
        let engine = Engine::open(config.clone()).unwrap();
        assert_eq!(insert_user(&engine, "alice"), ExecutionResult::Applied);
    }

    let engine = Engine::open(config).unwrap();
    assert_eq!(
        rows(engine.execute_query("SELECT username FROM users")),
        vec!["('alice',)"]
    );
}

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_insert_then_select() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(insert_user(&engine, "alice"), ExecutionResult::Applied);
    assert_eq!(
        rows(engine.execute_query("SELECT username FROM users")),
        vec!["('alice',)"]
    );
}

#[test]
fn test_update_and_delete() {
    let (_temp, engine) = setup_temp_engine();
    insert_user(&engine, "alice");
    insert_user(&engine, "bob");

    assert_eq!(
        engine.execute_command("UPDATE users SET password = 'new' WHERE username = 'bob'"),
        ExecutionResult::Applied
    );
    assert_eq!(
        engine.execute_command("DELETE FROM users WHERE username = 'alice'"),
        ExecutionResult::Applied
    );

    assert_eq!(
        rows(engine.execute_query("SELECT username, password FROM users")),
        vec!["('bob', 'new')"]
    );
}

#[test]
fn test_command_matching_no_rows_succeeds() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(
        engine.execute_command("DELETE FROM users WHERE username = 'ghost'"),
        ExecutionResult::Applied
    );
}

#[test]
fn test_constraint_violation_leaves_store_unchanged() {
    let (_temp, engine) = setup_temp_engine();
    insert_user(&engine, "alice");

    let message = failure(insert_user(&engine, "alice"));
    assert!(message.contains("UNIQUE constraint failed"), "got: {}", message);

    assert_eq!(
        rows(engine.execute_query("SELECT COUNT(*) FROM users")),
        vec!["(1,)"]
    );
}

#[test]
fn test_not_null_violation() {
    let (_temp, engine) = setup_temp_engine();

    let message = failure(engine.execute_command(
        "INSERT INTO login_history (username, login_time) VALUES ('alice', NULL)",
    ));
    assert!(message.contains("NOT NULL constraint failed"), "got: {}", message);
}

#[test]
fn test_malformed_command_reports_engine_message() {
    let (_temp, engine) = setup_temp_engine();

    let message = failure(engine.execute_command("SELEC FROM users"));
    assert!(message.contains("syntax error"), "got: {}", message);
    assert!(!message.starts_with("SQL error"));
}

#[test]
fn test_autoincrement_ids() {
    let (_temp, engine) = setup_temp_engine();
    insert_user(&engine, "alice");

    for t in ["10:00", "11:00"] {
        assert_eq!(
            engine.execute_command(&format!(
                "INSERT INTO login_history (username, login_time) VALUES ('alice', '{}')",
                t
            )),
            ExecutionResult::Applied
        );
    }

    assert_eq!(
        rows(engine.execute_query("SELECT id, login_time, logout_time FROM login_history ORDER BY id")),
        vec!["(1, '10:00', None)", "(2, '11:00', None)"]
    );
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_empty_result_set() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(
        engine.execute_query("SELECT * FROM users"),
        ExecutionResult::Rows(vec![])
    );
}

#[test]
fn test_query_preserves_store_order() {
    let (_temp, engine) = setup_temp_engine();
    for name in ["carol", "alice", "bob"] {
        insert_user(&engine, name);
    }

    assert_eq!(
        rows(engine.execute_query("SELECT username FROM users ORDER BY username DESC")),
        vec!["('carol',)", "('bob',)", "('alice',)"]
    );
}

#[test]
fn test_query_value_types() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(
        rows(engine.execute_query("SELECT 1, 2.5, 'it''s', NULL, x'00ff', -7, 3.0")),
        vec!["(1, 2.5, \"it's\", None, b'\\x00\\xff', -7, 3.0)"]
    );
}

#[test]
fn test_query_error() {
    let (_temp, engine) = setup_temp_engine();

    let message = failure(engine.execute_query("SELECT * FROM missing_table"));
    assert_eq!(message, "no such table: missing_table");
}

#[test]
fn test_execute_dispatches_on_kind() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(
        engine.execute(&Statement::new(
            "insert into users values ('dora', 'pw', '2024-02-02')"
        )),
        ExecutionResult::Applied
    );
    assert_eq!(
        engine.execute(&Statement::new("  select username from users")),
        ExecutionResult::Rows(vec!["('dora',)".to_string()])
    );
}

// =============================================================================
// Statement Shape Tests
// =============================================================================

const ONE_STATEMENT: &str = "You can only execute one statement at a time.";

#[test]
fn test_multiple_commands_are_rejected_unapplied() {
    let (_temp, engine) = setup_temp_engine();
    insert_user(&engine, "alice");

    let message = failure(engine.execute_command(
        "INSERT INTO users VALUES ('bob', 'pw', '2024-01-01'); DELETE FROM users",
    ));
    assert_eq!(message, ONE_STATEMENT);

    assert_eq!(
        rows(engine.execute_query("SELECT username FROM users")),
        vec!["('alice',)"]
    );
}

#[test]
fn test_multiple_queries_are_rejected() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(failure(engine.execute_query("SELECT 1; SELECT 2")), ONE_STATEMENT);
}

#[test]
fn test_trailing_separator_and_comment_are_one_statement() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(
        engine.execute_command("DELETE FROM users;  "),
        ExecutionResult::Applied
    );
    assert_eq!(
        rows(engine.execute_query("SELECT 1; -- trailing note")),
        vec!["(1,)"]
    );
}

#[test]
fn test_blank_and_comment_only_messages() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(engine.execute_command("   "), ExecutionResult::Applied);
    assert_eq!(
        engine.execute_command("-- only a comment"),
        ExecutionResult::Applied
    );
    assert_eq!(
        engine.execute_query("-- only a comment"),
        ExecutionResult::Rows(vec![])
    );
}

#[test]
fn test_vacuum_runs_outside_a_transaction() {
    let (_temp, engine) = setup_temp_engine();
    insert_user(&engine, "alice");

    assert_eq!(engine.execute_command("VACUUM"), ExecutionResult::Applied);
}

#[test]
fn test_journal_mode_pragma() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(
        engine.execute_command("PRAGMA journal_mode=WAL"),
        ExecutionResult::Applied
    );
    assert_eq!(
        rows(engine.execute_query("SELECT * FROM pragma_journal_mode")),
        vec!["('wal',)"]
    );
}

#[test]
fn test_begin_does_not_leave_store_locked() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(engine.execute_command("BEGIN"), ExecutionResult::Applied);
    assert_eq!(insert_user(&engine, "alice"), ExecutionResult::Applied);
    assert_eq!(
        rows(engine.execute_query("SELECT COUNT(*) FROM users")),
        vec!["(1,)"]
    );
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_engine_concurrent_writes() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);

    let mut handles = vec![];
    for t in 0..4 {
        let engine_clone = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..10 {
                let result = insert_user(&engine_clone, &format!("thread{}_user{}", t, i));
                assert_eq!(result, ExecutionResult::Applied);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        rows(engine.execute_query("SELECT COUNT(*) FROM users")),
        vec!["(40,)"]
    );
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_engine_open_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .db_path(temp_dir.path().join("relay.db"))
        .max_message_size(0)
        .build();

    match Engine::open(config) {
        Err(sqlrelay::RelayError::Config(msg)) => assert!(msg.contains("max_message_size")),
        Err(e) => panic!("Expected config error, got {}", e),
        Ok(_) => panic!("Expected config error"),
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.listen_addr, "127.0.0.1:7778");
    assert_eq!(config.max_connections, 0);
    assert_eq!(config.read_timeout_ms, 0);
    assert_eq!(config.write_timeout_ms, 0);
    assert!(config.validate().is_ok());
}
