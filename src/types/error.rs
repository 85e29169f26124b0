//! Error types for the bank ledger
//!
//! This module defines all error types that can occur while operating on
//! accounts. Every failure reaches the caller as a typed value; nothing is
//! swallowed by the engine.
//!
//! # Error Categories
//!
//! - **Lookup Errors**: missing accounts or users, duplicate account numbers
//! - **Validation Errors**: non-positive amounts, self-transfers, insufficient funds
//! - **Transient Errors**: lock timeouts and storage failures (retried by the engine)
//! - **Collaborator Errors**: rejected credentials, malformed request bodies
//! - **File Errors**: missing input files, CSV parse failures

use super::account::{AccountId, Amount};
use thiserror::Error;

/// Main error type for the ledger
///
/// Each variant includes the context needed to diagnose the failure.
/// `status_code` maps a variant onto the response class the HTTP-facing
/// collaborator returns for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Account or user absent
    #[error("{entity} {key} not found")]
    NotFound {
        /// Kind of record that was looked up ("account", "user")
        entity: String,
        /// Key used for the lookup (id or account number)
        key: String,
    },

    /// Account number already taken
    #[error("Account number '{account_number}' already exists")]
    Conflict {
        /// The duplicate account number
        account_number: String,
    },

    /// Non-positive amount
    ///
    /// Permanent: never retried.
    #[error("Invalid amount {amount} for {operation}")]
    InvalidAmount {
        /// The rejected amount
        amount: Amount,
        /// Operation that received it
        operation: String,
    },

    /// Withdrawal or transfer exceeds the balance
    ///
    /// Permanent: the account is left untouched.
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account number or id of the debited account
        account: String,
        /// Balance at the time of the check
        balance: Amount,
        /// Requested debit
        requested: Amount,
    },

    /// Self-transfer or malformed account pair
    #[error("Invalid transfer from account '{account_number}' to itself")]
    InvalidTransfer {
        /// Account number given as both source and destination
        account_number: String,
    },

    /// Account lock not acquired in time
    ///
    /// Transient: retried by the engine a bounded number of times.
    #[error("Account {account} is busy (waited {waited_ms}ms for lock)")]
    Busy {
        /// Account whose lock timed out
        account: AccountId,
        /// Time spent waiting, in milliseconds
        waited_ms: u64,
    },

    /// Backend I/O failure
    ///
    /// Transient: retried by the engine a bounded number of times.
    #[error("Storage failure: {message}")]
    StorageFailure {
        /// Description of the backend failure
        message: String,
    },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account id
        account: AccountId,
    },

    /// Caller failed the authentication gate
    #[error("Unauthorized: {reason}")]
    Unauthorized {
        /// Why the credentials were rejected
        reason: String,
    },

    /// Request body could not be parsed
    #[error("json: wrong params: {message}")]
    MalformedRequest {
        /// Parser message
        message: String,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// Recoverable in the replay pipelines: the row is skipped.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        LedgerError::MalformedRequest {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a NotFound error for an account looked up by id
    pub fn account_not_found(id: AccountId) -> Self {
        LedgerError::NotFound {
            entity: "account".to_string(),
            key: id.to_string(),
        }
    }

    /// Create a NotFound error for an account looked up by number
    pub fn account_number_not_found(account_number: &str) -> Self {
        LedgerError::NotFound {
            entity: "account".to_string(),
            key: account_number.to_string(),
        }
    }

    /// Create a NotFound error for a user
    pub fn user_not_found(id: u64) -> Self {
        LedgerError::NotFound {
            entity: "user".to_string(),
            key: id.to_string(),
        }
    }

    /// Create a Conflict error
    pub fn conflict(account_number: &str) -> Self {
        LedgerError::Conflict {
            account_number: account_number.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Amount, operation: &str) -> Self {
        LedgerError::InvalidAmount {
            amount,
            operation: operation.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: impl ToString, balance: Amount, requested: Amount) -> Self {
        LedgerError::InsufficientFunds {
            account: account.to_string(),
            balance,
            requested,
        }
    }

    /// Create an InvalidTransfer error
    pub fn invalid_transfer(account_number: &str) -> Self {
        LedgerError::InvalidTransfer {
            account_number: account_number.to_string(),
        }
    }

    /// Create a Busy error
    pub fn busy(account: AccountId, waited_ms: u64) -> Self {
        LedgerError::Busy { account, waited_ms }
    }

    /// Create a StorageFailure error
    pub fn storage_failure(message: impl Into<String>) -> Self {
        LedgerError::StorageFailure {
            message: message.into(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create an Unauthorized error
    pub fn unauthorized(reason: &str) -> Self {
        LedgerError::Unauthorized {
            reason: reason.to_string(),
        }
    }

    /// Whether the engine may retry the failed attempt
    ///
    /// Only lock timeouts and storage failures are transient. Validation
    /// failures are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Busy { .. } | LedgerError::StorageFailure { .. }
        )
    }

    /// Response status the HTTP-facing collaborator reports for this error
    pub fn status_code(&self) -> u16 {
        match self {
            LedgerError::NotFound { .. } => 404,
            LedgerError::Conflict { .. } => 409,
            LedgerError::InvalidAmount { .. }
            | LedgerError::InvalidTransfer { .. }
            | LedgerError::MalformedRequest { .. } => 400,
            LedgerError::InsufficientFunds { .. } => 422,
            LedgerError::Unauthorized { .. } => 401,
            LedgerError::Busy { .. } => 503,
            LedgerError::StorageFailure { .. }
            | LedgerError::ArithmeticOverflow { .. }
            | LedgerError::FileNotFound { .. }
            | LedgerError::IoError { .. }
            | LedgerError::ParseError { .. } => 500,
        }
    }
}
