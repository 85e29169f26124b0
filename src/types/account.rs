//! Account-related types for the bank ledger
//!
//! This module defines the Account record held by the account store and
//! the receipt returned by a completed transfer.

use super::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned account identifier
pub type AccountId = u64;

/// Monetary amount in the smallest currency unit
///
/// Balances carry no fractional component. Signed so that arithmetic on
/// requested amounts can be validated before it reaches a balance.
pub type Amount = i64;

/// Persisted account record
///
/// The account store is the only owner of the authoritative `balance`;
/// every copy handed out is a snapshot taken at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Identifier assigned by the store on creation
    pub id: AccountId,

    /// Owning user
    pub user_id: UserId,

    /// Externally chosen account number, unique and immutable
    pub account_number: String,

    /// Display name shown to the owner
    #[serde(rename = "name")]
    pub display_name: String,

    /// Current balance, never negative after a committed operation
    pub balance: Amount,

    pub created_at: DateTime<Utc>,

    /// Refreshed by every mutation
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account record with a zero balance
    ///
    /// Both timestamps are set to `now`.
    pub fn new(
        id: AccountId,
        user_id: UserId,
        account_number: impl Into<String>,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Account {
            id,
            user_id,
            account_number: account_number.into(),
            display_name: display_name.into(),
            balance: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Both sides of a committed transfer
///
/// Snapshots taken while the pair of account locks was still held, so the
/// balances reflect exactly this transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub from: Account,
    pub to: Account,
}
