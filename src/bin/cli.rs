//! SqlRelay CLI Client
//!
//! Sends SQL statements to a relay server and prints the raw responses.

use std::io::{self, BufRead};
use std::process;

use clap::Parser;
use sqlrelay::network::Client;

/// SqlRelay CLI
#[derive(Parser, Debug)]
#[command(name = "sqlrelay-cli")]
#[command(about = "CLI for a SqlRelay server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7778")]
    server: String,

    /// Statements to send, one per argument (reads stdin lines when empty)
    statements: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            process::exit(1);
        }
    };

    let result = if args.statements.is_empty() {
        let stdin = io::stdin();
        let mut status = Ok(());
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Failed to read stdin: {}", e);
                    process::exit(1);
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            status = send(&mut client, &line);
            if status.is_err() {
                break;
            }
        }
        status
    } else {
        args.statements
            .iter()
            .try_for_each(|sql| send(&mut client, sql))
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn send(client: &mut Client, sql: &str) -> sqlrelay::Result<()> {
    let response = client.send(sql)?;
    println!("{}", response);
    Ok(())
}
