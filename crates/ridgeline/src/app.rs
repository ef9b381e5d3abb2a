//! Wiring of the stores, services and routers into one HTTP surface.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use chrono::Duration;
use serde_json::{json, Value};

use crate::config::{AppConfig, MAX_TTL_SECS};
use crate::identity::{IdentityProvider, InMemoryIdentityProvider, SessionTokenCodec};
use crate::storage::{storage_router, InMemoryObjectStorage, ObjectStorage, UrlSigner};
use crate::store::{InMemoryKeyValueStore, KeyValueStore};
use crate::workflows::access::{access_router, AccessControl};
use crate::workflows::catalog::{catalog_router, CatalogService};
use crate::workflows::permits::{permit_router, PermitService, PermitSettings};

/// Knobs the backend needs beyond its three collaborators.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Path every route is mounted under, e.g. `/api/v1`. Empty mounts at root.
    pub service_prefix: String,
    pub max_upload_bytes: usize,
    pub permits: PermitSettings,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            service_prefix: String::new(),
            max_upload_bytes: 5 * 1024 * 1024,
            permits: PermitSettings::default(),
        }
    }
}

/// The assembled backend: one key-value store, one object store and one
/// identity provider shared by every workflow.
pub struct Backend<S, O, I> {
    store: Arc<S>,
    objects: Arc<O>,
    identity: Arc<I>,
    settings: BackendSettings,
}

pub type MemoryBackend =
    Backend<InMemoryKeyValueStore, InMemoryObjectStorage, InMemoryIdentityProvider>;

impl MemoryBackend {
    /// Process-local backend configured from the loaded settings.
    pub fn in_memory(config: &AppConfig) -> Self {
        let signer = UrlSigner::new(
            config.storage.signing_key.clone(),
            config.storage.bucket.clone(),
        );
        let objects = InMemoryObjectStorage::new(
            signer,
            config.server.object_url_base(),
            config.storage.max_upload_bytes,
        );
        let identity = InMemoryIdentityProvider::new(
            SessionTokenCodec::new(config.auth.token_secret.clone()),
            seconds(config.auth.session_ttl_secs),
        );

        Backend::new(
            Arc::new(InMemoryKeyValueStore::default()),
            Arc::new(objects),
            Arc::new(identity),
            BackendSettings {
                service_prefix: config.server.service_prefix.clone(),
                max_upload_bytes: config.storage.max_upload_bytes,
                permits: PermitSettings {
                    transitions: config.permits.transitions,
                    document_url_ttl: seconds(config.storage.signed_url_ttl_secs),
                },
            },
        )
    }
}

/// Lifetimes are capped at [`MAX_TTL_SECS`], which config loading enforces.
fn seconds(secs: u64) -> Duration {
    let capped = secs.min(MAX_TTL_SECS);
    Duration::try_seconds(capped as i64).unwrap_or_else(|| Duration::days(30))
}

impl<S, O, I> Backend<S, O, I>
where
    S: KeyValueStore + 'static,
    O: ObjectStorage + 'static,
    I: IdentityProvider + 'static,
{
    pub fn new(store: Arc<S>, objects: Arc<O>, identity: Arc<I>, settings: BackendSettings) -> Self {
        Self {
            store,
            objects,
            identity,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn objects(&self) -> &Arc<O> {
        &self.objects
    }

    pub fn identity(&self) -> &Arc<I> {
        &self.identity
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    pub fn access(&self) -> AccessControl<S, I> {
        AccessControl::new(self.store.clone(), self.identity.clone())
    }

    pub fn permits(&self) -> PermitService<S, O, I> {
        PermitService::new(
            self.store.clone(),
            self.objects.clone(),
            self.access(),
            self.settings.permits,
        )
    }

    pub fn catalog(&self) -> CatalogService<S, I> {
        CatalogService::new(self.store.clone(), self.access())
    }

    /// Every public route, mounted under the configured service prefix.
    pub fn router(&self) -> Router {
        let routes = Router::new()
            .route("/health", get(healthcheck))
            .merge(permit_router(Arc::new(self.permits())))
            .merge(catalog_router(Arc::new(self.catalog())))
            .merge(access_router(Arc::new(self.access())))
            .merge(storage_router(
                self.objects.clone(),
                self.settings.max_upload_bytes,
            ));

        let prefix = self.settings.service_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            routes
        } else {
            Router::new().nest(prefix, routes)
        }
    }
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
