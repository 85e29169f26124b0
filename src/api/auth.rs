//! Authentication gate for the collaborator surface
//!
//! Two independent checks guard the routes:
//!
//! - account-mutating and transfer routes need a pre-shared key that is on
//!   the `SecretStore` allow-list
//! - admin routes need fixed basic-auth credentials
//!
//! Both checks run before a request reaches the engine.

use crate::types::LedgerError;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Credentials presented with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pre-shared key, e.g. from an `Authorization` header
    ApiKey(String),
    /// HTTP basic auth pair
    Basic { username: String, password: String },
    None,
}

impl Credentials {
    pub fn api_key(key: impl Into<String>) -> Self {
        Credentials::ApiKey(key.into())
    }

    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A stored pre-shared key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Secret {
    pub id: u64,
    pub key: String,
}

/// Allow-list of pre-shared keys
#[derive(Debug)]
pub struct SecretStore {
    secrets: DashMap<String, u64>,
    next_id: AtomicU64,
}

impl SecretStore {
    pub fn new() -> Self {
        Self {
            secrets: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a key to the allow-list
    ///
    /// Adding a key that is already present returns the existing record.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRequest` for an empty key.
    pub fn insert(&self, key: &str) -> Result<Secret, LedgerError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(LedgerError::MalformedRequest {
                message: "key must not be empty".to_string(),
            });
        }

        let id = *self
            .secrets
            .entry(key.to_string())
            .or_insert_with(|| self.next_id.fetch_add(1, Ordering::Relaxed));

        Ok(Secret {
            id,
            key: key.to_string(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.secrets.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Check that the credentials carry an allowed key
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` when no key is presented or the key is unknown.
    pub fn authorize(&self, credentials: &Credentials) -> Result<(), LedgerError> {
        match credentials {
            Credentials::ApiKey(key) if self.contains(key) => Ok(()),
            Credentials::ApiKey(_) => Err(LedgerError::unauthorized("unknown api key")),
            _ => Err(LedgerError::unauthorized("api key required")),
        }
    }
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed basic-auth credentials for admin routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check the credentials against the admin pair
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for anything other than a matching basic-auth pair.
    pub fn authorize(&self, credentials: &Credentials) -> Result<(), LedgerError> {
        match credentials {
            Credentials::Basic { username, password }
                if *username == self.username && *password == self.password =>
            {
                Ok(())
            }
            Credentials::Basic { .. } => Err(LedgerError::unauthorized("invalid admin credentials")),
            _ => Err(LedgerError::unauthorized("admin credentials required")),
        }
    }
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self::new("admin", "1234")
    }
}
