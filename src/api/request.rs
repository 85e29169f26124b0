//! Requests and responses of the collaborator surface
//!
//! Each `Request` variant stands for one HTTP route. Bodies are carried as
//! raw JSON text and parsed by the gateway, so a malformed body is answered
//! the same way the HTTP layer would answer it.

use crate::types::{AccountId, Amount, LedgerError, UserId};
use serde::Deserialize;
use serde_json::{json, Value};

/// One collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `POST /users`
    CreateUser { body: String },
    /// `GET /users`
    ListUsers,
    /// `GET /users/{id}`
    GetUser { id: UserId },
    /// `GET /users/{id}/bankAccounts`
    ListUserAccounts { user_id: UserId },
    /// `POST /users/{id}/bankAccount`
    OpenAccount { user_id: UserId, body: String },
    /// `GET /bankAccounts/{id}`
    GetAccount { id: AccountId },
    /// `POST /bankAccounts/{id}/deposit`
    Deposit { id: AccountId, body: String },
    /// `PUT /bankAccounts/{id}/withdraw`
    Withdraw { id: AccountId, body: String },
    /// `POST /transfers`
    Transfer { body: String },
    /// `POST /admin/secrets`
    CreateSecret { body: String },
}

impl Request {
    /// HTTP method and path, for the access log
    pub fn route(&self) -> (&'static str, String) {
        match self {
            Request::CreateUser { .. } => ("POST", "/users".to_string()),
            Request::ListUsers => ("GET", "/users".to_string()),
            Request::GetUser { id } => ("GET", format!("/users/{}", id)),
            Request::ListUserAccounts { user_id } => {
                ("GET", format!("/users/{}/bankAccounts", user_id))
            }
            Request::OpenAccount { user_id, .. } => {
                ("POST", format!("/users/{}/bankAccount", user_id))
            }
            Request::GetAccount { id } => ("GET", format!("/bankAccounts/{}", id)),
            Request::Deposit { id, .. } => ("POST", format!("/bankAccounts/{}/deposit", id)),
            Request::Withdraw { id, .. } => ("PUT", format!("/bankAccounts/{}/withdraw", id)),
            Request::Transfer { .. } => ("POST", "/transfers".to_string()),
            Request::CreateSecret { .. } => ("POST", "/admin/secrets".to_string()),
        }
    }
}

/// Status code and JSON body returned to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn created(body: Value) -> Self {
        Self::new(201, body)
    }

    /// Error envelope: `{"object": "error", "message": ...}`
    pub fn error(error: &LedgerError) -> Self {
        Self::new(
            error.status_code(),
            json!({
                "object": "error",
                "message": error.to_string(),
            }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateUserBody {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAccountBody {
    pub account_number: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AmountBody {
    pub amount: Amount,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransferBody {
    pub from: String,
    pub to: String,
    pub amount: Amount,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SecretBody {
    pub key: String,
}
