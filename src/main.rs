//! Bank ledger CLI
//!
//! Replays an operation file (users, account openings, deposits,
//! withdrawals and transfers) against a fresh in-memory ledger and prints
//! the final accounts as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > accounts.csv
//! cargo run -- --strategy sequential operations.csv > accounts.csv
//! cargo run -- --strategy concurrent --batch-size 2000 --max-concurrent 8 operations.csv > accounts.csv
//! RUST_LOG=bank_ledger=debug cargo run -- operations.csv > accounts.csv
//! ```
//!
//! Logs go to stderr so stdout carries only the CSV output.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use bank_ledger::cli;
use bank_ledger::strategy;
use std::process;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(directives) => EnvFilter::try_new(directives).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = cli::parse_args();
    init_tracing(args.log_level.as_deref());

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Concurrent) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config, args.to_engine_config())
    };

    tracing::info!(strategy = ?args.strategy, input = %args.input_file.display(), "replaying operations");

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
