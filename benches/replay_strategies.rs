//! Benchmark suite for comparing replay strategies
//!
//! Compares the sequential and concurrent replay pipelines using the divan
//! benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! # Benchmark Fixtures
//!
//! Three generated operation files are used:
//! - `benchmark_small.csv` - 10 accounts, 100 balance operations
//! - `benchmark_medium.csv` - 50 accounts, 1,000 balance operations
//! - `benchmark_large.csv` - 500 accounts, 50,000 balance operations
//!
//! Each fixture opens and funds its accounts, then mixes deposits,
//! withdrawals and transfers between random accounts (some of them
//! self-transfers or overdrafts that the engine rejects).

use bank_ledger::cli::StrategyType;
use bank_ledger::core::EngineConfig;
use bank_ledger::strategy::{create_strategy, BatchConfig};
use std::path::Path;

fn main() {
    divan::main();
}

const FIXTURES: &[&str] = &[
    "benches/fixtures/benchmark_small.csv",
    "benches/fixtures/benchmark_medium.csv",
    "benches/fixtures/benchmark_large.csv",
];

fn replay(strategy_type: StrategyType, fixture: &str) {
    let strategy = create_strategy(
        strategy_type,
        Some(BatchConfig::default()),
        EngineConfig::default(),
    );
    let mut output = Vec::new();

    strategy
        .process(Path::new(fixture), &mut output)
        .expect("Processing failed");
}

/// Operations applied one at a time in file order
#[divan::bench(args = FIXTURES)]
fn sequential_strategy(fixture: &str) {
    replay(StrategyType::Sequential, fixture);
}

/// Batches partitioned by account and applied concurrently
#[divan::bench(args = FIXTURES)]
fn concurrent_strategy(fixture: &str) {
    replay(StrategyType::Concurrent, fixture);
}

/// Concurrent replay with 64-operation batches
#[divan::bench(args = FIXTURES)]
fn concurrent_strategy_small_batches(fixture: &str) {
    let strategy = create_strategy(
        StrategyType::Concurrent,
        Some(BatchConfig::new(64, num_cpus::get())),
        EngineConfig::default(),
    );
    let mut output = Vec::new();

    strategy
        .process(Path::new(fixture), &mut output)
        .expect("Processing failed");
}
