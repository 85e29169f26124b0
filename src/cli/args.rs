use crate::core::EngineConfig;
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay banking operations against an in-memory ledger
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(
    about = "Replay deposits, withdrawals and transfers against an in-memory ledger",
    long_about = None
)]
pub struct CliArgs {
    /// Input CSV file path containing operation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Replay strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        env = "BANK_LEDGER_STRATEGY",
        default_value = "concurrent",
        help = "Replay strategy: 'sequential' for file order or 'concurrent' for batched parallel replay"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (concurrent mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        env = "BANK_LEDGER_BATCH_SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of account partitions in flight (concurrent mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        env = "BANK_LEDGER_MAX_CONCURRENT",
        help = "Maximum number of account partitions processed concurrently (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    /// Account lock timeout in milliseconds
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MS",
        env = "BANK_LEDGER_LOCK_TIMEOUT_MS",
        help = "Longest wait for an account lock before an operation is busy (default: 5000)"
    )]
    pub lock_timeout_ms: Option<u64>,

    /// Retries after a busy or storage failure
    #[arg(
        long = "max-retries",
        value_name = "COUNT",
        env = "BANK_LEDGER_MAX_RETRIES",
        help = "Retries for busy or storage failures (default: 3)"
    )]
    pub max_retries: Option<u32>,

    /// Pause before the first retry in milliseconds
    #[arg(
        long = "retry-backoff-ms",
        value_name = "MS",
        env = "BANK_LEDGER_RETRY_BACKOFF_MS",
        help = "Pause before the first retry, growing with each attempt (default: 10)"
    )]
    pub retry_backoff_ms: Option<u64>,

    /// Log filter, overrides RUST_LOG
    #[arg(
        long = "log-level",
        value_name = "FILTER",
        help = "Log filter such as 'info' or 'bank_ledger=debug' (default: RUST_LOG or 'warn')"
    )]
    pub log_level: Option<String>,
}

/// Available replay strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sequential,
    Concurrent,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Falls back to default values for anything not provided. Zero values
    /// are repaired by `BatchConfig::new` with a logged warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_concurrent),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create an EngineConfig from CLI arguments
    pub fn to_engine_config(&self) -> EngineConfig {
        let default = EngineConfig::default();
        EngineConfig::new(
            self.lock_timeout_ms
                .unwrap_or(default.lock_timeout.as_millis() as u64),
            self.max_retries.unwrap_or(default.max_retries),
            self.retry_backoff_ms
                .unwrap_or(default.retry_backoff.as_millis() as u64),
        )
    }
}
