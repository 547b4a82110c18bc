//! SqlRelay Server Binary
//!
//! Initializes the database and starts the TCP server.

use std::sync::Arc;

use clap::Parser;
use sqlrelay::config::{DEFAULT_HOST, DEFAULT_PORT};
use sqlrelay::network::Server;
use sqlrelay::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// SqlRelay Server
#[derive(Parser, Debug)]
#[command(name = "sqlrelay-server")]
#[command(about = "Relay null-terminated SQL statements over TCP to SQLite")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Host to bind
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// SQLite database file
    #[arg(short, long, default_value = "sqlrelay.db")]
    db: String,

    /// Label used in log output
    #[arg(long, default_value = "SQL_RELAY_SERVER")]
    server_name: String,

    /// Maximum concurrent connections (0 = unbounded)
    #[arg(short, long, default_value = "0")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlrelay=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("SqlRelay Server v{}", sqlrelay::VERSION);
    tracing::info!("Database file: {}", args.db);

    let config = Config::builder()
        .db_path(&args.db)
        .listen_addr(format!("{}:{}", args.host, args.port))
        .server_name(&args.server_name)
        .max_connections(args.max_connections)
        .build();

    // Schema must exist before the first connection is accepted
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };

    let handle = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        handle.shutdown();
    }) {
        tracing::error!("Failed to set Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
