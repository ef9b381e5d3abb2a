//! Identity provider seam: sign-up, sign-in and stateless session token
//! resolution.

mod memory;
mod password;
mod token;

pub use memory::InMemoryIdentityProvider;
pub use token::{SessionClaims, SessionTokenCodec};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a user by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public profile of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: UserId,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Sign-up payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    Created(UserIdentity),
    AlreadyExists,
}

/// Issued session token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserIdentity,
}

pub trait IdentityProvider: Send + Sync {
    /// Resolve a session token to the user it was issued for.
    fn resolve(&self, token: &str) -> Result<UserIdentity, IdentityError>;

    fn sign_up(&self, registration: Registration) -> Result<SignUpOutcome, IdentityError>;

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token has expired")]
    TokenExpired,
    #[error("invalid token: {0}")]
    TokenInvalid(String),
    #[error("unknown user")]
    UnknownUser,
    #[error("{0}")]
    Validation(String),
    #[error("cryptography error: {0}")]
    Crypto(String),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}
