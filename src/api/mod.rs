//! Collaborator contract
//!
//! The surface an HTTP layer consumes: authentication gate, request
//! dispatch onto the engine, status mapping and JSON bodies.
//!
//! # Components
//!
//! - `auth` - API-key allow-list and admin basic-auth credentials
//! - `request` - route-shaped requests and JSON responses
//! - `gateway` - dispatch with logging

pub mod auth;
pub mod gateway;
pub mod request;

pub use auth::{AdminCredentials, Credentials, Secret, SecretStore};
pub use gateway::Gateway;
pub use request::{Request, Response};
