//! Per-account lock manager
//!
//! This module provides `LockManager`, which hands out exclusive,
//! account-scoped locks for the balance engine's critical sections.
//!
//! # Design
//!
//! Each account id maps to its own `tokio::sync::Mutex`, created on first
//! use and kept in a `DashMap`. Operations on disjoint accounts never share
//! a mutex, so there is no global lock.
//!
//! Guards are `OwnedMutexGuard`s bundled into an `AccountLock`. Dropping the
//! guard (including dropping a cancelled future that owns it) releases the
//! lock immediately.
//!
//! An account's mutex stays registered only while someone holds or waits
//! for it. The last party to let go removes the entry, so lookups of ids
//! that never become accounts leave nothing behind.
//!
//! # Deadlock Freedom
//!
//! Two-account critical sections always acquire in ascending id order, never
//! in the order the caller supplied. Every acquisition is bounded by a
//! timeout, after which the attempt fails with `Busy` and releases anything
//! it already held.

use crate::types::{AccountId, LedgerError};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<AccountId, Arc<Mutex<()>>>;

/// Remove `id`'s mutex if the map holds the only reference to it
///
/// Holders and waiters each own a clone of the `Arc`, and clones are only
/// taken under the shard lock, so a count of one means nobody can be using it.
fn prune(locks: &LockMap, id: AccountId) {
    locks.remove_if(&id, |_, mutex| Arc::strong_count(mutex) == 1);
}

/// Held lock on one or two accounts
///
/// The critical section lasts as long as this value lives.
#[derive(Debug)]
pub struct AccountLock {
    ids: Vec<AccountId>,
    guards: Vec<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl AccountLock {
    /// Account ids covered by this lock, in acquisition order
    pub fn ids(&self) -> &[AccountId] {
        &self.ids
    }

    fn push(&mut self, id: AccountId, guard: OwnedMutexGuard<()>) {
        self.ids.push(id);
        self.guards.push(guard);
    }
}

impl Drop for AccountLock {
    fn drop(&mut self) {
        self.guards.clear();
        for id in &self.ids {
            prune(&self.locks, *id);
        }
    }
}

/// Prunes the entry of an acquisition that ends without a guard
/// (timeout or cancellation)
struct Waiter<'a> {
    locks: &'a LockMap,
    id: AccountId,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        prune(self.locks, self.id);
    }
}

/// Registry of per-account mutexes
#[derive(Debug, Default)]
pub struct LockManager {
    locks: Arc<LockMap>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }

    fn mutex_for(&self, id: AccountId) -> Arc<Mutex<()>> {
        // Clone the Arc out so the shard lock is released before awaiting
        Arc::clone(
            self.locks
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    fn empty_lock(&self) -> AccountLock {
        AccountLock {
            ids: Vec::with_capacity(2),
            guards: Vec::with_capacity(2),
            locks: Arc::clone(&self.locks),
        }
    }

    async fn acquire(
        &self,
        id: AccountId,
        started: Instant,
        timeout: Duration,
    ) -> Result<OwnedMutexGuard<()>, LedgerError> {
        // Declared before `mutex` so it is dropped after it
        let _waiter = Waiter {
            locks: &self.locks,
            id,
        };
        let remaining = timeout.saturating_sub(started.elapsed());
        let mutex = self.mutex_for(id);

        tokio::time::timeout(remaining, mutex.lock_owned())
            .await
            .map_err(|_| {
                tracing::debug!(account = id, ?timeout, "lock acquisition timed out");
                LedgerError::busy(id, started.elapsed().as_millis() as u64)
            })
    }

    /// Lock a single account
    ///
    /// # Errors
    ///
    /// Returns `Busy` if the lock is not acquired within `timeout`.
    pub async fn lock_one(
        &self,
        id: AccountId,
        timeout: Duration,
    ) -> Result<AccountLock, LedgerError> {
        let started = Instant::now();
        let mut lock = self.empty_lock();
        lock.push(id, self.acquire(id, started, timeout).await?);
        Ok(lock)
    }

    /// Lock two accounts in ascending id order
    ///
    /// The timeout covers both acquisitions together. If the second lock
    /// times out, the first guard is dropped before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Busy` naming the account whose lock timed out.
    pub async fn lock_pair(
        &self,
        a: AccountId,
        b: AccountId,
        timeout: Duration,
    ) -> Result<AccountLock, LedgerError> {
        if a == b {
            return self.lock_one(a, timeout).await;
        }

        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let started = Instant::now();

        let mut lock = self.empty_lock();
        for id in [first, second] {
            lock.push(id, self.acquire(id, started, timeout).await?);
        }
        Ok(lock)
    }

    /// Number of accounts that currently have a registered mutex
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
