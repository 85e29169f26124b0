//! Bank Ledger Library
//!
//! # Overview
//!
//! The balance-mutation core of a small banking service: accounts owned by
//! users, and three operations that change balances (deposit, withdraw,
//! transfer) under a strict "never negative, never lost" rule, safe under
//! arbitrary concurrency.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, User, Operation, LedgerError)
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - The only writer of balances; locking, retries, compensation
//!   - [`core::account_store`] - In-memory account store behind the [`core::AccountStore`] seam
//!   - [`core::lock_manager`] - Per-account locks with timeouts
//!   - [`core::directory`] - Registered users
//! - [`api`] - Collaborator contract: auth gate, request dispatch, status mapping
//! - [`io`] - Operation CSV readers and the accounts CSV writer
//! - [`strategy`] - Sequential and concurrent replay pipelines
//! - [`cli`] - CLI arguments parsing
//!
//! # Balance Rules
//!
//! - Amounts are integers in the smallest currency unit and must be positive
//! - A withdrawal or transfer never takes a balance below zero
//! - A transfer moves money atomically: both balances change or neither does
//! - Operations touching the same account are linearizable; operations on
//!   disjoint accounts never wait for each other

pub mod api;
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use api::{Gateway, Request, Response};
pub use crate::core::{AccountStore, BalanceEngine, EngineConfig, MemoryAccountStore, UserDirectory};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountId, Amount, LedgerError, Operation, OperationKind, TransferReceipt, User,
    UserId,
};
