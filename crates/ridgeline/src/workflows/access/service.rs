use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::identity::{IdentityProvider, UserIdentity};
use crate::store::{is_truthy, KeyValueStore, KeyValueStoreExt, StoreError};

/// Namespace holding one grant document per admin user.
pub const ADMIN_PREFIX: &str = "admin:";

fn grant_key(user_id: &str) -> String {
    format!("{ADMIN_PREFIX}{user_id}")
}

/// Persisted marker that a user may review permits and curate content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminGrant {
    pub is_admin: bool,
    pub granted_at: DateTime<Utc>,
}

/// Answer to "is the caller an admin?", used by the admin login screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCheck {
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// First grant in an empty admin set; no caller authorization needed.
    Bootstrapped,
    /// Granted by an existing admin.
    Granted,
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves session tokens and admin grants on every privileged call.
pub struct AccessControl<S, I> {
    store: Arc<S>,
    identity: Arc<I>,
}

impl<S, I> AccessControl<S, I>
where
    S: KeyValueStore + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(store: Arc<S>, identity: Arc<I>) -> Self {
        Self { store, identity }
    }

    pub fn identity(&self) -> &Arc<I> {
        &self.identity
    }

    /// Resolve the caller; any failure leaves them unauthenticated.
    pub fn authenticate(&self, token: Option<&str>) -> Option<UserIdentity> {
        let token = token?;
        match self.identity.resolve(token) {
            Ok(user) => Some(user),
            Err(err) => {
                debug!(error = %err, "session token did not resolve");
                None
            }
        }
    }

    fn is_granted(&self, user: &UserIdentity) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(&grant_key(&user.id.0))?
            .as_ref()
            .is_some_and(is_truthy))
    }

    /// The caller's identity when they hold an admin grant.
    pub fn require_admin(&self, token: Option<&str>) -> Result<UserIdentity, AccessError> {
        let user = self.authenticate(token).ok_or(AccessError::Unauthorized)?;
        if self.is_granted(&user)? {
            Ok(user)
        } else {
            debug!(user_id = %user.id, "caller has no admin grant");
            Err(AccessError::Unauthorized)
        }
    }

    /// Never fails: lookup errors are logged and reported as "not admin".
    pub fn check_admin(&self, token: Option<&str>) -> AdminCheck {
        let Some(user) = self.authenticate(token) else {
            return AdminCheck {
                is_admin: false,
                user: None,
            };
        };

        let is_admin = self.is_granted(&user).unwrap_or_else(|err| {
            warn!(error = %err, user_id = %user.id, "admin grant lookup failed");
            false
        });
        AdminCheck {
            is_admin,
            user: Some(user),
        }
    }

    /// Grant admin to `user_id`. Allowed without authorization only while
    /// no grant exists; the emptiness check and the write are one atomic
    /// store operation.
    pub fn grant_admin(
        &self,
        token: Option<&str>,
        user_id: &str,
    ) -> Result<GrantOutcome, AccessError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AccessError::Validation("userId is required".to_string()));
        }

        let grant = AdminGrant {
            is_admin: true,
            granted_at: Utc::now(),
        };
        let key = grant_key(user_id);
        let encoded = serde_json::to_value(&grant).map_err(StoreError::Encode)?;

        if self.store.set_if_prefix_empty(ADMIN_PREFIX, &key, encoded)? {
            info!(%user_id, "bootstrapped first admin");
            return Ok(GrantOutcome::Bootstrapped);
        }

        let granter = self.require_admin(token)?;
        self.store.set_as(&key, &grant)?;
        info!(%user_id, granted_by = %granter.id, "admin granted");
        Ok(GrantOutcome::Granted)
    }
}

impl<S, I> Clone for AccessControl<S, I> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            identity: Arc::clone(&self.identity),
        }
    }
}
