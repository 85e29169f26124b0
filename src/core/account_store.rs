//! In-memory account store
//!
//! This module provides `MemoryAccountStore`, the default `AccountStore`
//! backend. Records live in a `DashMap` keyed by id, with a second `DashMap`
//! acting as the unique index on account number.
//!
//! # Thread Safety
//!
//! Individual calls are atomic with respect to the record they touch. The
//! store does not serialise read-modify-write sequences across calls; the
//! engine holds the per-account lock for that.

use crate::core::traits::AccountStore;
use crate::types::{Account, AccountId, Amount, LedgerError, UserId};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe in-memory account store
///
/// Ids are assigned from a counter starting at 1 and are never reused,
/// even after a delete.
#[derive(Debug)]
pub struct MemoryAccountStore {
    /// Account records by id
    accounts: DashMap<AccountId, Account>,

    /// Unique index: account number to id
    numbers: DashMap<String, AccountId>,

    next_id: AtomicU64,
}

impl MemoryAccountStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            numbers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for MemoryAccountStore {
    fn get_by_id(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    fn get_by_account_number(&self, account_number: &str) -> Result<Account, LedgerError> {
        let id = self
            .numbers
            .get(account_number)
            .map(|entry| *entry.value())
            .ok_or_else(|| LedgerError::account_number_not_found(account_number))?;

        // The index entry can outlive a concurrent delete by a moment
        self.accounts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::account_number_not_found(account_number))
    }

    fn create(
        &self,
        user_id: UserId,
        account_number: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, LedgerError> {
        // Claiming the index entry first makes racing creates of the same
        // number resolve to exactly one winner.
        match self.numbers.entry(account_number.to_string()) {
            Entry::Occupied(_) => Err(LedgerError::conflict(account_number)),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let account = Account::new(id, user_id, account_number, display_name, now);
                self.accounts.insert(id, account.clone());
                slot.insert(id);
                Ok(account)
            }
        }
    }

    fn set_balance(
        &self,
        id: AccountId,
        balance: Amount,
        updated_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| LedgerError::account_not_found(id))?;
        let account = entry.value_mut();
        account.balance = balance;
        account.updated_at = updated_at;
        Ok(())
    }

    fn delete(&self, id: AccountId) -> Result<Account, LedgerError> {
        let (_, account) = self
            .accounts
            .remove(&id)
            .ok_or_else(|| LedgerError::account_not_found(id))?;
        self.numbers.remove(&account.account_number);
        Ok(account)
    }

    fn all(&self) -> Result<Vec<Account>, LedgerError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = MemoryAccountStore::new();
        let now = Utc::now();

        let first = store.create(1, "ACC-1", "Checking", now).unwrap();
        let second = store.create(1, "ACC-2", "Savings", now).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.balance, 0);
        assert_eq!(first.created_at, now);
        assert_eq!(first.updated_at, now);
    }

    #[test]
    fn test_create_rejects_duplicate_number() {
        let store = MemoryAccountStore::new();
        let now = Utc::now();

        store.create(1, "ACC-1", "Checking", now).unwrap();
        let result = store.create(2, "ACC-1", "Other", now);

        assert_eq!(result.unwrap_err(), LedgerError::conflict("ACC-1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_by_id_and_number() {
        let store = MemoryAccountStore::new();
        let created = store.create(3, "ACC-9", "Main", Utc::now()).unwrap();

        assert_eq!(store.get_by_id(created.id).unwrap(), created);
        assert_eq!(store.get_by_account_number("ACC-9").unwrap(), created);
    }

    #[test]
    fn test_lookups_on_missing_account() {
        let store = MemoryAccountStore::new();

        assert_eq!(
            store.get_by_id(5).unwrap_err(),
            LedgerError::account_not_found(5)
        );
        assert_eq!(
            store.get_by_account_number("nope").unwrap_err(),
            LedgerError::account_number_not_found("nope")
        );
    }

    #[test]
    fn test_set_balance_updates_timestamp() {
        let store = MemoryAccountStore::new();
        let created_at = Utc::now();
        let account = store.create(1, "ACC-1", "Main", created_at).unwrap();

        let later = created_at + chrono::Duration::seconds(5);
        store.set_balance(account.id, 250, later).unwrap();

        let stored = store.get_by_id(account.id).unwrap();
        assert_eq!(stored.balance, 250);
        assert_eq!(stored.updated_at, later);
        assert_eq!(stored.created_at, created_at);
    }

    #[test]
    fn test_set_balance_does_not_enforce_sign() {
        let store = MemoryAccountStore::new();
        let account = store.create(1, "ACC-1", "Main", Utc::now()).unwrap();

        store.set_balance(account.id, -10, Utc::now()).unwrap();
        assert_eq!(store.get_by_id(account.id).unwrap().balance, -10);
    }

    #[test]
    fn test_set_balance_missing_account() {
        let store = MemoryAccountStore::new();
        let result = store.set_balance(1, 10, Utc::now());
        assert_eq!(result.unwrap_err(), LedgerError::account_not_found(1));
    }

    #[test]
    fn test_delete_frees_account_number() {
        let store = MemoryAccountStore::new();
        let account = store.create(1, "ACC-1", "Main", Utc::now()).unwrap();

        store.delete(account.id).unwrap();
        assert!(store.get_by_account_number("ACC-1").is_err());

        let reopened = store.create(1, "ACC-1", "Main", Utc::now()).unwrap();
        assert_ne!(reopened.id, account.id);
    }

    #[test]
    fn test_all_sorted_by_id() {
        let store = MemoryAccountStore::new();
        let now = Utc::now();
        for number in ["C", "A", "B"] {
            store.create(1, number, number, now).unwrap();
        }

        let ids: Vec<AccountId> = store.all().unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_concurrent_create_same_number_has_one_winner() {
        let store = Arc::new(MemoryAccountStore::new());
        let mut handles = vec![];

        for user in 0..16u64 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store.create(user, "SHARED", "Shared", Utc::now()).is_ok()
            }));
        }

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }
}
