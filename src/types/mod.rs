//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account records and identifiers
//! - `user`: User records owning accounts
//! - `operation`: Replayable balance and directory operations
//! - `error`: Error types for the ledger

pub mod account;
pub mod error;
pub mod operation;
pub mod user;

pub use account::{Account, AccountId, Amount, TransferReceipt};
pub use error::LedgerError;
pub use operation::{Operation, OperationKind};
pub use user::{User, UserId};
