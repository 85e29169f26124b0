//! Balance operation engine
//!
//! This module provides `BalanceEngine`, the only component allowed to
//! change an account balance. It enforces the balance invariants and
//! serialises conflicting operations.
//!
//! # Architecture
//!
//! ```text
//! BalanceEngine
//!     ├── Arc<dyn AccountStore>  (authoritative account records)
//!     ├── Arc<UserDirectory>     (ownership validation on open)
//!     ├── Arc<LockManager>       (per-account critical sections)
//!     └── Arc<MonotonicClock>    (updated_at source)
//! ```
//!
//! # Critical Sections
//!
//! Every balance operation acquires the lock of each account it touches,
//! reads the current balance from the store, validates, and writes the new
//! balance before the lock is released. Transfers lock both accounts in
//! ascending id order.
//!
//! # Transfer Atomicity
//!
//! The store has no multi-row commit. A transfer debits the source, then
//! credits the destination. If the credit fails, the source balance is
//! restored while both locks are still held, and the restore is retried
//! until it succeeds, so no other operation ever observes the half-applied
//! state.
//!
//! The restore runs in its own task that owns the locks. Dropping the
//! caller's future (a timeout, an aborted request) stops the caller from
//! waiting but never stops the restore or releases the locks early.
//!
//! # Retries
//!
//! `Busy` and `StorageFailure` are retried up to `max_retries` times.
//! Validation failures are returned immediately.

use crate::core::clock::MonotonicClock;
use crate::core::directory::UserDirectory;
use crate::core::lock_manager::LockManager;
use crate::core::traits::AccountStore;
use crate::core::MemoryAccountStore;
use crate::types::{
    Account, AccountId, Amount, LedgerError, TransferReceipt, User, UserId,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on the pause between compensation attempts
const MAX_COMPENSATION_BACKOFF: Duration = Duration::from_secs(1);

/// Engine tuning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Longest wait for an account lock before failing with `Busy`
    pub lock_timeout: Duration,
    /// Retries after a transient failure (`Busy`, `StorageFailure`)
    pub max_retries: u32,
    /// Pause before the first retry, grows linearly with each attempt
    pub retry_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            max_retries: 3,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

impl EngineConfig {
    /// Create an EngineConfig from millisecond values
    ///
    /// A zero lock timeout would make every contended operation fail, so it
    /// falls back to the default with a warning.
    pub fn new(lock_timeout_ms: u64, max_retries: u32, retry_backoff_ms: u64) -> Self {
        let default = Self::default();

        let lock_timeout = if lock_timeout_ms == 0 {
            tracing::warn!(
                "Invalid lock_timeout_ms ({}), using default ({}ms)",
                lock_timeout_ms,
                default.lock_timeout.as_millis()
            );
            default.lock_timeout
        } else {
            Duration::from_millis(lock_timeout_ms)
        };

        Self {
            lock_timeout,
            max_retries,
            retry_backoff: Duration::from_millis(retry_backoff_ms),
        }
    }
}

/// Balance operation engine
///
/// Cheap to clone; clones share the store, directory, locks and clock, so
/// any number of tasks may drive the same ledger concurrently.
#[derive(Debug, Clone)]
pub struct BalanceEngine {
    store: Arc<dyn AccountStore>,
    directory: Arc<UserDirectory>,
    locks: Arc<LockManager>,
    clock: Arc<MonotonicClock>,
    config: EngineConfig,
}

impl BalanceEngine {
    /// Create an engine over an existing store and directory
    pub fn new(
        store: Arc<dyn AccountStore>,
        directory: Arc<UserDirectory>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            directory,
            locks: Arc::new(LockManager::new()),
            clock: Arc::new(MonotonicClock::new()),
            config,
        }
    }

    /// Create an engine backed by a fresh in-memory store and directory
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::new(
            Arc::new(MemoryAccountStore::new()),
            Arc::new(UserDirectory::new()),
            config,
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Register a user
    pub fn create_user(&self, first_name: &str, last_name: &str) -> User {
        self.directory
            .create_user(first_name, last_name, self.clock.now())
    }

    /// Open an account for an existing user
    ///
    /// The balance starts at zero.
    ///
    /// # Errors
    ///
    /// * `NotFound` - If the user does not exist
    /// * `Conflict` - If the account number is taken
    pub async fn open_account(
        &self,
        user_id: UserId,
        account_number: &str,
        display_name: &str,
    ) -> Result<Account, LedgerError> {
        self.directory.get(user_id)?;

        let account = self
            .with_retry("open", || async move {
                self.store
                    .create(user_id, account_number, display_name, self.clock.now())
            })
            .await?;

        tracing::debug!(
            account = account.id,
            user = user_id,
            number = %account.account_number,
            "opened account"
        );
        Ok(account)
    }

    /// Remove an account row
    ///
    /// Waits for in-flight operations on the account to finish first.
    pub async fn delete_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self
            .with_retry("delete", || async move {
                let _lock = self.locks.lock_one(id, self.config.lock_timeout).await?;
                self.store.delete(id)
            })
            .await?;

        tracing::debug!(account = id, "deleted account");
        Ok(account)
    }

    /// Credit `amount` to an account
    ///
    /// # Returns
    ///
    /// The account as written at the end of the critical section.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - If `amount` is zero or negative
    /// * `NotFound` - If the account does not exist
    /// * `ArithmeticOverflow` - If the balance would overflow
    /// * `Busy` / `StorageFailure` - After retries are exhausted
    pub async fn deposit(&self, id: AccountId, amount: Amount) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount, "deposit"));
        }

        let account = self
            .with_retry("deposit", || self.try_deposit(id, amount))
            .await?;

        tracing::debug!(account = id, amount, balance = account.balance, "deposit committed");
        Ok(account)
    }

    async fn try_deposit(&self, id: AccountId, amount: Amount) -> Result<Account, LedgerError> {
        let _lock = self.locks.lock_one(id, self.config.lock_timeout).await?;

        let mut account = self.store.get_by_id(id)?;
        let balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("deposit", id))?;

        let now = self.clock.now();
        self.store.set_balance(id, balance, now)?;

        account.balance = balance;
        account.updated_at = now;
        Ok(account)
    }

    /// Debit `amount` from an account
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - If `amount` is zero or negative
    /// * `NotFound` - If the account does not exist
    /// * `InsufficientFunds` - If the balance is below `amount`; nothing is written
    /// * `Busy` / `StorageFailure` - After retries are exhausted
    pub async fn withdraw(&self, id: AccountId, amount: Amount) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount, "withdraw"));
        }

        let account = self
            .with_retry("withdraw", || self.try_withdraw(id, amount))
            .await?;

        tracing::debug!(account = id, amount, balance = account.balance, "withdrawal committed");
        Ok(account)
    }

    async fn try_withdraw(&self, id: AccountId, amount: Amount) -> Result<Account, LedgerError> {
        let _lock = self.locks.lock_one(id, self.config.lock_timeout).await?;

        let mut account = self.store.get_by_id(id)?;
        if account.balance < amount {
            return Err(LedgerError::insufficient_funds(
                &account.account_number,
                account.balance,
                amount,
            ));
        }

        let balance = account.balance - amount;
        let now = self.clock.now();
        self.store.set_balance(id, balance, now)?;

        account.balance = balance;
        account.updated_at = now;
        Ok(account)
    }

    /// Move `amount` from one account to another
    ///
    /// Both accounts are addressed by account number. Either both balances
    /// change or neither does.
    ///
    /// # Returns
    ///
    /// Both updated accounts, as written inside the critical section.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - If `amount` is zero or negative
    /// * `InvalidTransfer` - If source and destination are the same account
    /// * `NotFound` - If either account does not exist; nothing is written
    /// * `InsufficientFunds` - If the source balance is below `amount`
    /// * `ArithmeticOverflow` - If the destination balance would overflow
    /// * `Busy` / `StorageFailure` - After retries are exhausted
    pub async fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<TransferReceipt, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::invalid_amount(amount, "transfer"));
        }
        if from == to {
            return Err(LedgerError::invalid_transfer(from));
        }

        let receipt = self
            .with_retry("transfer", || self.try_transfer(from, to, amount))
            .await?;

        tracing::debug!(
            from = %receipt.from.account_number,
            to = %receipt.to.account_number,
            amount,
            "transfer committed"
        );
        Ok(receipt)
    }

    async fn try_transfer(
        &self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<TransferReceipt, LedgerError> {
        let from_id = self.store.get_by_account_number(from)?.id;
        let to_id = self.store.get_by_account_number(to)?.id;

        let lock = self
            .locks
            .lock_pair(from_id, to_id, self.config.lock_timeout)
            .await?;

        // Fresh reads inside the critical section
        let mut source = self.store.get_by_id(from_id)?;
        let mut destination = self.store.get_by_id(to_id)?;

        if source.balance < amount {
            return Err(LedgerError::insufficient_funds(
                &source.account_number,
                source.balance,
                amount,
            ));
        }
        let debited = source.balance - amount;
        let credited = destination
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", to_id))?;

        let now = self.clock.now();
        self.store.set_balance(from_id, debited, now)?;

        if let Err(error) = self.store.set_balance(to_id, credited, now) {
            tracing::warn!(
                from = from_id,
                to = to_id,
                %error,
                "credit failed, reverting debit"
            );
            let engine = self.clone();
            let original = source.balance;
            let repair = tokio::spawn(async move {
                engine.restore_balance(from_id, original).await;
                drop(lock);
            });
            if let Err(join_error) = repair.await {
                tracing::error!(account = from_id, %join_error, "debit revert task failed");
            }
            return Err(error);
        }

        source.balance = debited;
        source.updated_at = now;
        destination.balance = credited;
        destination.updated_at = now;

        Ok(TransferReceipt {
            from: source,
            to: destination,
        })
    }

    /// Write back a pre-operation balance, retrying until the store accepts it
    ///
    /// The account lock must be held for the whole call.
    async fn restore_balance(&self, id: AccountId, balance: Amount) {
        let mut attempt: u32 = 0;
        loop {
            match self.store.set_balance(id, balance, self.clock.now()) {
                Ok(()) => {
                    tracing::info!(account = id, balance, attempt, "debit reverted");
                    return;
                }
                Err(error) => {
                    attempt += 1;
                    tracing::error!(account = id, balance, attempt, %error, "debit revert failed");
                    let backoff = self
                        .config
                        .retry_backoff
                        .saturating_mul(attempt)
                        .min(MAX_COMPENSATION_BACKOFF);
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut retries: u32 = 0;
        loop {
            match attempt().await {
                Err(error) if error.is_retryable() && retries < self.config.max_retries => {
                    retries += 1;
                    tracing::warn!(operation, retry = retries, %error, "transient failure, retrying");
                    tokio::time::sleep(self.config.retry_backoff.saturating_mul(retries)).await;
                }
                result => return result,
            }
        }
    }

    /// Current state of one account
    pub fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store.get_by_id(id)
    }

    /// Current state of one account, by account number
    pub fn account_by_number(&self, account_number: &str) -> Result<Account, LedgerError> {
        self.store.get_by_account_number(account_number)
    }

    /// Snapshot of every account, sorted by id
    pub fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        self.store.all()
    }

    /// Accounts owned by one user, sorted by id
    ///
    /// # Errors
    ///
    /// * `NotFound` - If the user does not exist
    pub fn accounts_for_user(&self, user_id: UserId) -> Result<Vec<Account>, LedgerError> {
        self.directory.get(user_id)?;

        Ok(self
            .store
            .all()?
            .into_iter()
            .filter(|account| account.user_id == user_id)
            .collect())
    }

    /// Sum of every balance
    pub fn total_balance(&self) -> Result<i128, LedgerError> {
        Ok(self
            .store
            .all()?
            .iter()
            .map(|account| account.balance as i128)
            .sum())
    }
}
