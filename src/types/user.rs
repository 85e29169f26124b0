//! User records
//!
//! Users own zero or more accounts. They sit outside the balance core and
//! are consulted only to validate ownership when an account is opened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directory-assigned user identifier
pub type UserId = u64;

/// A registered account holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: UserId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        User {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
