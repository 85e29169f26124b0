//! Processing strategy module for replaying operation files
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! encompassing both CSV parsing and balance engine processing. This allows
//! different processing implementations (sequential, concurrent batch) to be
//! selected at runtime.

use crate::cli::StrategyType;
use crate::core::EngineConfig;
use std::io::Write;
use std::path::Path;

pub mod batch_processor;
pub mod concurrent;
pub mod replay;
pub mod sequential;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use concurrent::{BatchConfig, ConcurrentProcessingStrategy};
pub use replay::{apply_operation, ReplayStats};
pub use sequential::SequentialProcessingStrategy;

/// Processing strategy trait for complete replay pipelines
///
/// Each strategy reads operations from a CSV file, applies them to a fresh
/// ledger, and writes the final account states to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay operations from input file and write results to output
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input CSV file containing operation records
    /// * `output` - Mutable reference to a writer for outputting account states
    ///
    /// # Returns
    ///
    /// * `Ok(())` if processing completed (possibly with rejected operations)
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error, etc.)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened (file not found, permission denied)
    /// - The runtime cannot be started
    /// - Output cannot be written
    ///
    /// Individual operation failures are logged but do not cause this method
    /// to return an error. Processing continues with the next operation.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create
/// * `config` - Optional batch configuration (ignored for sequential)
/// * `engine_config` - Lock timeout and retry policy for the engine
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    engine_config: EngineConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sequential => Box::new(SequentialProcessingStrategy::new(engine_config)),
        StrategyType::Concurrent => {
            let config = config.unwrap_or_default();
            Box::new(ConcurrentProcessingStrategy::new(config, engine_config))
        }
    }
}
