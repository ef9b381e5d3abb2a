use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use super::token::SessionTokenCodec;
use super::{IdentityError, IdentityProvider, Registration, Session, SignUpOutcome, UserId, UserIdentity};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
struct StoredUser {
    identity: UserIdentity,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Directory {
    users: HashMap<UserId, StoredUser>,
    by_email: HashMap<String, UserId>,
}

/// User directory held in process memory; sessions are stateless tokens.
#[derive(Debug, Clone)]
pub struct InMemoryIdentityProvider {
    codec: SessionTokenCodec,
    session_ttl: Duration,
    directory: Arc<Mutex<Directory>>,
}

impl InMemoryIdentityProvider {
    pub fn new(codec: SessionTokenCodec, session_ttl: Duration) -> Self {
        Self {
            codec,
            session_ttl,
            directory: Arc::default(),
        }
    }

    fn directory(&self) -> Result<MutexGuard<'_, Directory>, IdentityError> {
        self.directory
            .lock()
            .map_err(|_| IdentityError::Unavailable("directory lock poisoned".to_string()))
    }
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn resolve(&self, token: &str) -> Result<UserIdentity, IdentityError> {
        let claims = self.codec.decode(token)?;
        let directory = self.directory()?;
        directory
            .users
            .get(&UserId(claims.sub))
            .map(|user| user.identity.clone())
            .ok_or(IdentityError::UnknownUser)
    }

    fn sign_up(&self, registration: Registration) -> Result<SignUpOutcome, IdentityError> {
        let email = normalize_email(&registration.email);
        if email.is_empty() || !email.contains('@') {
            return Err(IdentityError::Validation(
                "a valid email address is required".to_string(),
            ));
        }
        if registration.password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.directory()?.by_email.contains_key(&email) {
            return Ok(SignUpOutcome::AlreadyExists);
        }

        // Hashed outside the lock.
        let password_hash = hash_password(&registration.password)?;
        let identity = UserIdentity {
            id: UserId(Uuid::new_v4().to_string()),
            email: email.clone(),
            name: registration
                .name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        };

        let mut directory = self.directory()?;
        if directory.by_email.contains_key(&email) {
            return Ok(SignUpOutcome::AlreadyExists);
        }
        directory.by_email.insert(email, identity.id.clone());
        directory.users.insert(
            identity.id.clone(),
            StoredUser {
                identity: identity.clone(),
                password_hash,
            },
        );
        info!(user_id = %identity.id, "user registered");

        Ok(SignUpOutcome::Created(identity))
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let user = {
            let directory = self.directory()?;
            directory
                .by_email
                .get(&normalize_email(email))
                .and_then(|id| directory.users.get(id))
                .cloned()
                .ok_or(IdentityError::InvalidCredentials)?
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(IdentityError::InvalidCredentials);
        }

        let issued_at = Utc::now();
        let expires_at = issued_at
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| IdentityError::Crypto("session lifetime out of range".to_string()))?;
        let access_token = self
            .codec
            .issue(&user.identity.id, issued_at, expires_at)?;

        Ok(Session {
            access_token,
            expires_at,
            user: user.identity,
        })
    }
}
