//! Concurrent batch replay strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Operations are read in batches and each batch is
//! applied with account-based partitioning.
//!
//! # Architecture
//!
//! ```text
//! ConcurrentProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (barriers + account partitioning)
//!     └── BalanceEngine (per-account locks, retries)
//! ```
//!
//! # Ordering
//!
//! - Batches are processed one after another
//! - `user` and `open` rows are applied in file order, after everything before them
//! - Balance operations sharing an account keep their file order, including
//!   the credited side of a transfer
//! - Balance operations with no account in common may interleave
//!
//! Every account therefore sees its operations in file order, so the final
//! ledger matches a sequential replay of the same file.

use crate::core::{BalanceEngine, EngineConfig};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_accounts_csv;
use crate::strategy::batch_processor::BatchProcessor;
use crate::strategy::replay::ReplayStats;
use crate::strategy::ProcessingStrategy;
use std::io::Write;
use std::path::Path;

/// Configuration for batch processing
///
/// Controls how operations are batched and how many account partitions are
/// applied at the same time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Maximum number of partitions in flight, also the worker thread count
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                "Invalid batch_size ({}), using default ({})",
                batch_size,
                default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            tracing::warn!(
                "Invalid max_concurrent ({}), using default ({})",
                max_concurrent,
                default.max_concurrent
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

/// Concurrent batch replay strategy
#[derive(Debug, Clone)]
pub struct ConcurrentProcessingStrategy {
    config: BatchConfig,
    engine_config: EngineConfig,
}

impl ConcurrentProcessingStrategy {
    /// Create a new ConcurrentProcessingStrategy
    ///
    /// # Arguments
    ///
    /// * `config` - BatchConfig with batch_size and max_concurrent
    /// * `engine_config` - Lock timeout and retry policy for the engine
    pub fn new(config: BatchConfig, engine_config: EngineConfig) -> Self {
        Self {
            config,
            engine_config,
        }
    }
}

impl ProcessingStrategy for ConcurrentProcessingStrategy {
    /// Replay operations from the input file and write the resulting accounts
    ///
    /// 1. Creates a tokio multi-threaded runtime
    /// 2. Reads operations in batches from CSV using AsyncReader
    /// 3. Applies each batch through the BatchProcessor, waiting for it to
    ///    finish before reading the next one
    /// 4. Writes every account to output using csv_format::write_accounts_csv
    ///
    /// # Error Handling
    ///
    /// Fatal errors (file not found, I/O errors, runtime errors) are returned
    /// immediately. Malformed rows and rejected operations are logged and
    /// skipped.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent)
            .enable_time()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let engine = BalanceEngine::in_memory(self.engine_config.clone());
            let processor = BatchProcessor::new(engine.clone(), self.config.max_concurrent);
            let stats = ReplayStats::new();

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for processed in processor.process_batch(batch).await {
                    stats.record(&processed.operation, &processed.result);
                }
            }
            stats.record_malformed(reader.skipped());
            stats.log_summary("concurrent");

            let accounts = engine
                .accounts()
                .map_err(|e| format!("Failed to read accounts: {}", e))?;
            write_accounts_csv(&accounts, output)?;

            Ok(())
        })
    }
}
