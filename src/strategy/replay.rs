//! Applying replayed operations to the engine
//!
//! Both pipelines feed parsed `Operation`s through `apply_operation`, so a
//! file produces the same ledger regardless of the strategy that read it.

use crate::core::BalanceEngine;
use crate::types::{LedgerError, Operation};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Apply one operation
///
/// Deposit and withdraw rows address accounts by number; the number is
/// resolved to the store id before the engine is called.
///
/// # Errors
///
/// Whatever the engine returns for the operation. Callers log and count
/// these; a rejected operation never aborts a replay.
pub async fn apply_operation(
    engine: &BalanceEngine,
    operation: Operation,
) -> Result<(), LedgerError> {
    match operation {
        Operation::User {
            first_name,
            last_name,
        } => {
            engine.create_user(&first_name, &last_name);
        }
        Operation::Open {
            account_number,
            user_id,
            display_name,
        } => {
            engine
                .open_account(user_id, &account_number, &display_name)
                .await?;
        }
        Operation::Deposit {
            account_number,
            amount,
        } => {
            let id = engine.account_by_number(&account_number)?.id;
            engine.deposit(id, amount).await?;
        }
        Operation::Withdraw {
            account_number,
            amount,
        } => {
            let id = engine.account_by_number(&account_number)?.id;
            engine.withdraw(id, amount).await?;
        }
        Operation::Transfer { from, to, amount } => {
            engine.transfer(&from, &to, amount).await?;
        }
    }
    Ok(())
}

/// Counters for a replay run
#[derive(Debug, Default)]
pub struct ReplayStats {
    applied: AtomicUsize,
    rejected: AtomicUsize,
    malformed: AtomicUsize,
}

impl ReplayStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of an applied operation, logging rejections
    pub fn record(&self, operation: &Operation, result: &Result<(), LedgerError>) {
        match result {
            Ok(()) => {
                self.applied.fetch_add(1, Ordering::Relaxed);
            }
            Err(error) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(kind = ?operation.kind(), %error, "operation rejected");
            }
        }
    }

    pub fn record_malformed(&self, count: usize) {
        self.malformed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> usize {
        self.malformed.load(Ordering::Relaxed)
    }

    /// Emit the end-of-run summary
    pub fn log_summary(&self, strategy: &str) {
        tracing::info!(
            strategy,
            applied = self.applied(),
            rejected = self.rejected(),
            malformed = self.malformed(),
            "replay finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;

    fn deposit(account: &str, amount: i64) -> Operation {
        Operation::Deposit {
            account_number: account.to_string(),
            amount,
        }
    }

    async fn engine_with_accounts(numbers: &[&str]) -> BalanceEngine {
        let engine = BalanceEngine::in_memory(EngineConfig::default());
        let user = engine.create_user("Ada", "Lovelace");
        for number in numbers {
            engine.open_account(user.id, number, number).await.unwrap();
        }
        engine
    }

    #[tokio::test]
    async fn test_apply_user_then_open() {
        let engine = BalanceEngine::in_memory(EngineConfig::default());

        apply_operation(
            &engine,
            Operation::User {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
            },
        )
        .await
        .unwrap();
        apply_operation(
            &engine,
            Operation::Open {
                account_number: "A".to_string(),
                user_id: 1,
                display_name: "Main".to_string(),
            },
        )
        .await
        .unwrap();

        let account = engine.account_by_number("A").unwrap();
        assert_eq!(account.user_id, 1);
        assert_eq!(account.display_name, "Main");
        assert_eq!(account.balance, 0);
    }

    #[tokio::test]
    async fn test_apply_balance_operations_by_number() {
        let engine = engine_with_accounts(&["A", "B"]).await;

        apply_operation(&engine, deposit("A", 100)).await.unwrap();
        apply_operation(
            &engine,
            Operation::Withdraw {
                account_number: "A".to_string(),
                amount: 40,
            },
        )
        .await
        .unwrap();
        apply_operation(
            &engine,
            Operation::Transfer {
                from: "A".to_string(),
                to: "B".to_string(),
                amount: 30,
            },
        )
        .await
        .unwrap();

        assert_eq!(engine.account_by_number("A").unwrap().balance, 30);
        assert_eq!(engine.account_by_number("B").unwrap().balance, 30);
    }

    #[tokio::test]
    async fn test_apply_unknown_account_is_not_found() {
        let engine = engine_with_accounts(&[]).await;

        let error = apply_operation(&engine, deposit("missing", 5))
            .await
            .unwrap_err();

        assert_eq!(error, LedgerError::account_number_not_found("missing"));
    }

    #[tokio::test]
    async fn test_stats_count_outcomes() {
        let stats = ReplayStats::new();
        let operation = deposit("A", 1);

        stats.record(&operation, &Ok(()));
        stats.record(&operation, &Err(LedgerError::invalid_amount(0, "deposit")));
        stats.record_malformed(2);

        assert_eq!(stats.applied(), 1);
        assert_eq!(stats.rejected(), 1);
        assert_eq!(stats.malformed(), 2);
    }
}
