//! Request dispatch onto the balance engine
//!
//! `Gateway` is the boundary an HTTP layer would sit on: it checks
//! credentials, parses the JSON body, calls the engine and maps the outcome
//! onto a status code and a JSON body. Every handled request is logged with
//! its method, path and status.

use crate::api::auth::{AdminCredentials, Credentials, SecretStore};
use crate::api::request::{
    AmountBody, CreateUserBody, OpenAccountBody, Request, Response, SecretBody, TransferBody,
};
use crate::core::BalanceEngine;
use crate::types::LedgerError;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, LedgerError> {
    Ok(serde_json::from_str(body)?)
}

/// Collaborator entry point
#[derive(Debug, Clone)]
pub struct Gateway {
    engine: BalanceEngine,
    secrets: Arc<SecretStore>,
    admin: AdminCredentials,
}

impl Gateway {
    pub fn new(engine: BalanceEngine, secrets: Arc<SecretStore>, admin: AdminCredentials) -> Self {
        Self {
            engine,
            secrets,
            admin,
        }
    }

    pub fn engine(&self) -> &BalanceEngine {
        &self.engine
    }

    pub fn secrets(&self) -> &SecretStore {
        &self.secrets
    }

    /// Handle one request
    ///
    /// Never fails: every error is rendered as an error response with the
    /// status that matches its kind.
    pub async fn handle(&self, credentials: &Credentials, request: Request) -> Response {
        let (method, path) = request.route();

        let response = match self.dispatch(credentials, request).await {
            Ok(response) => response,
            Err(error) => Response::error(&error),
        };

        tracing::info!(method, path = %path, status = response.status, "request handled");
        response
    }

    async fn dispatch(
        &self,
        credentials: &Credentials,
        request: Request,
    ) -> Result<Response, LedgerError> {
        match request {
            Request::CreateUser { body } => {
                let body: CreateUserBody = parse_body(&body)?;
                let user = self.engine.create_user(&body.first_name, &body.last_name);
                Ok(Response::created(json!(user)))
            }
            Request::ListUsers => Ok(Response::ok(json!(self.engine.directory().all()))),
            Request::GetUser { id } => {
                let user = self.engine.directory().get(id)?;
                Ok(Response::ok(json!(user)))
            }
            Request::ListUserAccounts { user_id } => {
                let accounts = self.engine.accounts_for_user(user_id)?;
                Ok(Response::ok(json!(accounts)))
            }
            Request::OpenAccount { user_id, body } => {
                self.secrets.authorize(credentials)?;
                let body: OpenAccountBody = parse_body(&body)?;
                let account_number = body.account_number.trim();
                if account_number.is_empty() {
                    return Err(LedgerError::MalformedRequest {
                        message: "account_number must not be empty".to_string(),
                    });
                }
                let name = body.name.as_deref().unwrap_or(account_number);

                let account = self
                    .engine
                    .open_account(user_id, account_number, name)
                    .await?;
                Ok(Response::created(json!(account)))
            }
            Request::GetAccount { id } => Ok(Response::ok(json!(self.engine.account(id)?))),
            Request::Deposit { id, body } => {
                self.secrets.authorize(credentials)?;
                let body: AmountBody = parse_body(&body)?;
                let account = self.engine.deposit(id, body.amount).await?;
                Ok(Response::ok(json!(account)))
            }
            Request::Withdraw { id, body } => {
                self.secrets.authorize(credentials)?;
                let body: AmountBody = parse_body(&body)?;
                let account = self.engine.withdraw(id, body.amount).await?;
                Ok(Response::ok(json!(account)))
            }
            Request::Transfer { body } => {
                self.secrets.authorize(credentials)?;
                let body: TransferBody = parse_body(&body)?;
                let receipt = self
                    .engine
                    .transfer(&body.from, &body.to, body.amount)
                    .await?;
                Ok(Response::ok(json!({
                    "status": "success",
                    "from": receipt.from,
                    "to": receipt.to,
                })))
            }
            Request::CreateSecret { body } => {
                self.admin.authorize(credentials)?;
                let body: SecretBody = parse_body(&body)?;
                let secret = self.secrets.insert(&body.key)?;
                Ok(Response::created(json!(secret)))
            }
        }
    }
}
