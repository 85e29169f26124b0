//! Batch processing with account-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which applies a batch of
//! operations concurrently while keeping the file order of every account's
//! operations, so a file produces the same ledger as a sequential replay.
//!
//! # Design
//!
//! A batch is cut into segments at every `user` or `open` row. Those rows are
//! barriers: everything before them finishes first, then they are applied
//! alone, so an account always exists before any balance row that follows it
//! in the file.
//!
//! Inside a segment, balance operations are grouped by the accounts they
//! touch: a transfer joins the groups of both its accounts, so any two
//! operations sharing an account, directly or through a chain of transfers,
//! land in the same partition. Each partition runs sequentially in its own
//! task; partitions run concurrently, at most `max_concurrent` at a time.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── BalanceEngine    (shared, cheap to clone)
//!     └── Arc<Semaphore>   (bounds partitions in flight)
//! ```
//!
//! # Thread Safety
//!
//! The processor is cloneable and can be safely shared across async tasks.
//! Partitions never share an account, so the engine's per-account locks are
//! only contended by callers outside the processor.

use crate::core::BalanceEngine;
use crate::strategy::replay::apply_operation;
use crate::types::{LedgerError, Operation};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Result of applying a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was applied
    pub operation: Operation,

    /// The outcome reported by the engine
    pub result: Result<(), LedgerError>,
}

/// Batch processor with account-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: BalanceEngine,
    permits: Arc<Semaphore>,
}

/// Union-find over account numbers
#[derive(Debug, Default)]
struct AccountGroups {
    index: HashMap<String, usize>,
    parent: Vec<usize>,
}

impl AccountGroups {
    fn slot(&mut self, account: &str) -> usize {
        if let Some(&slot) = self.index.get(account) {
            return slot;
        }
        let slot = self.parent.len();
        self.parent.push(slot);
        self.index.insert(account.to_string(), slot);
        slot
    }

    fn root(&mut self, mut slot: usize) -> usize {
        while self.parent[slot] != slot {
            self.parent[slot] = self.parent[self.parent[slot]];
            slot = self.parent[slot];
        }
        slot
    }

    fn join(&mut self, accounts: &[&str]) -> Option<usize> {
        let (first, rest) = accounts.split_first()?;
        let first = self.slot(first);
        for account in rest {
            let slot = self.slot(account);
            let (a, b) = (self.root(first), self.root(slot));
            self.parent[b] = a;
        }
        Some(first)
    }
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine shared by every partition task
    /// * `max_concurrent` - Partitions allowed to run at the same time
    pub fn new(engine: BalanceEngine, max_concurrent: usize) -> Self {
        Self {
            engine,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Partition operations into groups that share no account
    ///
    /// # Guarantees
    ///
    /// - Each operation appears in exactly one partition
    /// - Operations touching a common account are in the same partition
    /// - Operations in a partition keep their original order
    /// - Operations touching no account get a partition of their own
    pub fn partition_by_accounts(&self, operations: Vec<Operation>) -> Vec<Vec<Operation>> {
        let mut groups = AccountGroups::default();
        let slots: Vec<Option<usize>> = operations
            .iter()
            .map(|operation| groups.join(&operation.account_numbers()))
            .collect();

        let mut partitions: Vec<Vec<Operation>> = Vec::new();
        let mut by_root: HashMap<usize, usize> = HashMap::new();

        for (operation, slot) in operations.into_iter().zip(slots) {
            let Some(slot) = slot else {
                partitions.push(vec![operation]);
                continue;
            };
            let root = groups.root(slot);
            let position = *by_root.entry(root).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[position].push(operation);
        }

        partitions
    }

    /// Apply one partition's operations in order
    pub async fn process_account_operations(
        &self,
        operations: Vec<Operation>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(operations.len());

        for operation in operations {
            let result = apply_operation(&self.engine, operation.clone()).await;
            results.push(ProcessingResult { operation, result });
        }

        results
    }

    /// Apply a batch
    ///
    /// # Returns
    ///
    /// One `ProcessingResult` per operation. Results inside a segment may be
    /// in a different order than the input due to concurrent processing.
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(batch.len());
        let mut segment = Vec::new();

        for operation in batch {
            if operation.kind().mutates_balance() {
                segment.push(operation);
                continue;
            }

            results.extend(self.process_segment(std::mem::take(&mut segment)).await);

            let result = apply_operation(&self.engine, operation.clone()).await;
            results.push(ProcessingResult { operation, result });
        }

        results.extend(self.process_segment(segment).await);
        results
    }

    /// Run the partitions of one barrier-free segment concurrently
    async fn process_segment(&self, segment: Vec<Operation>) -> Vec<ProcessingResult> {
        if segment.is_empty() {
            return Vec::new();
        }

        let mut tasks = Vec::new();
        for operations in self.partition_by_accounts(segment) {
            let processor = self.clone();
            let permits = Arc::clone(&self.permits);
            tasks.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                processor.process_account_operations(operations).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(partition_results) => results.extend(partition_results),
                Err(e) => {
                    tracing::error!("Partition task failed: {}", e);
                }
            }
        }

        results
    }
}
