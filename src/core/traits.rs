//! Core traits for account persistence
//!
//! This module defines the storage seam between the balance engine and the
//! backend that materialises account records. The engine owns every
//! invariant; implementations are dumb persistence.

use crate::types::{Account, AccountId, Amount, LedgerError, UserId};
use chrono::{DateTime, Utc};
use std::fmt;

/// Trait for persisting account records
///
/// Provides keyed reads and unconditional writes. Implementations must be
/// safe to share across tasks; they do not serialise read-then-write
/// sequences, which is the engine's job.
pub trait AccountStore: Send + Sync + fmt::Debug {
    /// Get an account by its store-assigned id
    fn get_by_id(&self, id: AccountId) -> Result<Account, LedgerError>;

    /// Get an account by its unique account number
    fn get_by_account_number(&self, account_number: &str) -> Result<Account, LedgerError>;

    /// Create an account with a zero balance
    ///
    /// Fails with `Conflict` if the account number already exists.
    fn create(
        &self,
        user_id: UserId,
        account_number: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, LedgerError>;

    /// Overwrite an account's balance and `updated_at`
    ///
    /// Unconditional: no sign check, no comparison with the previous value.
    fn set_balance(
        &self,
        id: AccountId,
        balance: Amount,
        updated_at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Remove an account row
    fn delete(&self, id: AccountId) -> Result<Account, LedgerError>;

    /// Snapshot of every account, sorted by id
    fn all(&self) -> Result<Vec<Account>, LedgerError>;
}
