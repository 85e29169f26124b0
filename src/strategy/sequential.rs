//! Sequential replay strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. Operations are applied strictly in file order.
//!
//! # Design
//!
//! The SequentialProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Balance changes to `BalanceEngine` via `apply_operation`
//! - CSV output to `csv_format::write_accounts_csv` (format handling)
//!
//! # Memory Efficiency
//!
//! Records are streamed one at a time. Memory usage is O(accounts + users),
//! not O(operations).
//!
//! # Runtime
//!
//! The engine API is async because of its lock timeouts, so the strategy
//! drives it on a current-thread tokio runtime. With one operation in flight
//! at a time no lock is ever contended.

use crate::core::{BalanceEngine, EngineConfig};
use crate::io::csv_format::write_accounts_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::replay::{apply_operation, ReplayStats};
use crate::strategy::ProcessingStrategy;
use std::io::Write;
use std::path::Path;

/// Sequential replay strategy
///
/// # Examples
///
/// ```no_run
/// use bank_ledger::core::EngineConfig;
/// use bank_ledger::strategy::{ProcessingStrategy, SequentialProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SequentialProcessingStrategy::new(EngineConfig::default());
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("operations.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SequentialProcessingStrategy {
    engine_config: EngineConfig,
}

impl SequentialProcessingStrategy {
    pub fn new(engine_config: EngineConfig) -> Self {
        Self { engine_config }
    }
}

impl ProcessingStrategy for SequentialProcessingStrategy {
    /// Replay operations from the input file and write the resulting accounts
    ///
    /// 1. Opens a SyncReader over the CSV file
    /// 2. Applies each operation through a fresh in-memory BalanceEngine
    /// 3. Writes every account to output using csv_format::write_accounts_csv
    ///
    /// # Error Handling
    ///
    /// Fatal errors (file not found, I/O errors) are returned immediately.
    /// Malformed rows and rejected operations are logged and skipped.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let reader = SyncReader::new(input_path)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let engine = BalanceEngine::in_memory(self.engine_config.clone());
        let stats = ReplayStats::new();

        runtime.block_on(async {
            for result in reader {
                match result {
                    Ok(operation) => {
                        let outcome = apply_operation(&engine, operation.clone()).await;
                        stats.record(&operation, &outcome);
                    }
                    Err(e) => {
                        stats.record_malformed(1);
                        tracing::warn!("CSV parsing error: {}", e);
                    }
                }
            }
        });
        stats.log_summary("sequential");

        let accounts = engine
            .accounts()
            .map_err(|e| format!("Failed to read accounts: {}", e))?;
        write_accounts_csv(&accounts, output)?;

        Ok(())
    }
}
