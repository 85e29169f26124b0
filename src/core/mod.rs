//! Core business logic module
//!
//! This module contains the balance-mutation components:
//! - `traits` - The `AccountStore` persistence seam
//! - `account_store` - In-memory `AccountStore` backend
//! - `lock_manager` - Per-account critical sections with timeouts
//! - `clock` - Monotonic timestamps for mutations
//! - `directory` - Users owning accounts
//! - `engine` - Deposit, withdraw and transfer orchestration

pub mod account_store;
pub mod clock;
pub mod directory;
pub mod engine;
pub mod lock_manager;
pub mod traits;

pub use account_store::MemoryAccountStore;
pub use clock::MonotonicClock;
pub use directory::UserDirectory;
pub use engine::{BalanceEngine, EngineConfig};
pub use lock_manager::{AccountLock, LockManager};
pub use traits::AccountStore;
