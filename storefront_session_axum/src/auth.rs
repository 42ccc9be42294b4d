//! Credential verification is delegated to the application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A verified user, as returned to the client after login.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    #[serde(rename = "id")]
    pub user_id: String,
    pub roles: Vec<String>,
    /// Extra fields the front-end displays; omitted when null.
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub profile: serde_json::Value,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
            profile: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("Authentication backend error: {0}")]
    Internal(String),
}

/// Verifies credentials for the login and register endpoints.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthError>;

    async fn register(&self, registration: &Registration) -> Result<Identity, AuthError>;

    /// Profile fields for `GET /auth/me`.
    async fn profile(&self, _user_id: &str) -> Result<serde_json::Value, AuthError> {
        Ok(serde_json::Value::Null)
    }
}
