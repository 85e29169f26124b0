//! User directory
//!
//! Keeps the registered users that own accounts. The balance engine only
//! asks it whether a user exists before opening an account; the remaining
//! operations back the user-profile routes of the collaborator layer.

use crate::types::{LedgerError, User, UserId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe registry of users
#[derive(Debug)]
pub struct UserDirectory {
    users: DashMap<UserId, User>,
    next_id: AtomicU64,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a user and return the stored record
    pub fn create_user(&self, first_name: &str, last_name: &str, now: DateTime<Utc>) -> User {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = User::new(id, first_name, last_name, now);
        self.users.insert(id, user.clone());
        tracing::debug!(user = id, "registered user");
        user
    }

    /// Look up a user
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no user has this id.
    pub fn get(&self, id: UserId) -> Result<User, LedgerError> {
        self.users
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::user_not_found(id))
    }

    pub fn exists(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    /// All users sorted by id
    pub fn all(&self) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by_key(|user| user.id);
        users
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}
