use std::sync::Arc;

use axum::response::Response;
use chrono::Duration;
use serde_json::Value;

use crate::identity::{
    IdentityProvider, InMemoryIdentityProvider, Registration, SessionTokenCodec, SignUpOutcome,
};
use crate::storage::{
    InMemoryObjectStorage, ObjectContent, ObjectStorage, ObjectUpload, SignedUrl, StorageError,
    StoredObject, UrlSigner,
};
use crate::store::{InMemoryKeyValueStore, KeyValueStore, StoreError};
use crate::workflows::access::AccessControl;
use crate::workflows::permits::{PermitService, PermitSettings, PermitSubmission};

pub(super) type MemoryService =
    PermitService<InMemoryKeyValueStore, InMemoryObjectStorage, InMemoryIdentityProvider>;

pub(super) const ADMIN_EMAIL: &str = "ops@ridgeline.test";
pub(super) const RIDER_EMAIL: &str = "rider@ridgeline.test";
const PASSWORD: &str = "gata-loops-21";

pub(super) struct Harness {
    pub(super) store: Arc<InMemoryKeyValueStore>,
    pub(super) objects: Arc<InMemoryObjectStorage>,
    pub(super) identity: Arc<InMemoryIdentityProvider>,
    pub(super) access: AccessControl<InMemoryKeyValueStore, InMemoryIdentityProvider>,
}

impl Harness {
    pub(super) fn service(&self, settings: PermitSettings) -> MemoryService {
        PermitService::new(
            self.store.clone(),
            self.objects.clone(),
            self.access.clone(),
            settings,
        )
    }

    /// Signs up `email` and returns a fresh session token for it.
    pub(super) fn session_for(&self, email: &str) -> (String, String) {
        let outcome = self
            .identity
            .sign_up(Registration {
                email: email.to_string(),
                password: PASSWORD.to_string(),
                name: None,
            })
            .expect("sign up");
        let user_id = match outcome {
            SignUpOutcome::Created(user) => user.id.0,
            SignUpOutcome::AlreadyExists => panic!("{email} registered twice"),
        };
        let session = self.identity.sign_in(email, PASSWORD).expect("sign in");
        (user_id, session.access_token)
    }

    /// Registers and bootstraps the first admin, returning their token.
    pub(super) fn admin_token(&self) -> String {
        let (user_id, token) = self.session_for(ADMIN_EMAIL);
        self.access
            .grant_admin(None, &user_id)
            .expect("bootstrap admin");
        token
    }

    pub(super) fn upload_document(&self) -> String {
        self.objects
            .upload(ObjectUpload {
                folder: "permits".to_string(),
                file_name: "passport.pdf".to_string(),
                content_type: mime::APPLICATION_PDF,
                bytes: b"%PDF-1.7 passport scan".to_vec(),
            })
            .expect("upload")
            .path
    }
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(InMemoryKeyValueStore::default());
    let objects = Arc::new(InMemoryObjectStorage::new(
        UrlSigner::new(b"permit-tests-signing-key-permit-t".to_vec(), "ridgeline-permits"),
        "http://localhost:3000/api/v1/storage/objects",
        1024 * 1024,
    ));
    let identity = Arc::new(InMemoryIdentityProvider::new(
        SessionTokenCodec::new(b"permit-tests-session-secret-perm".to_vec()),
        Duration::hours(1),
    ));
    let access = AccessControl::new(store.clone(), identity.clone());
    Harness {
        store,
        objects,
        identity,
        access,
    }
}

pub(super) fn submission(document_path: &str) -> PermitSubmission {
    serde_json::from_value(serde_json::json!({
        "fullName": "Tsering Dolma",
        "email": RIDER_EMAIL,
        "phone": "+91-9876500000",
        "destination": "Nubra Valley",
        "idType": "PASSPORT",
        "idNumber": "P7788990",
        "dlNumber": "HP-3420110",
        "documentPath": document_path,
    }))
    .expect("submission decodes")
}

/// Key-value store whose every call fails.
pub(super) struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Unavailable("kv offline".to_string()))
    }

    fn mget(&self, _keys: &[String]) -> Result<Vec<Option<Value>>, StoreError> {
        Err(StoreError::Unavailable("kv offline".to_string()))
    }

    fn set(&self, _key: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("kv offline".to_string()))
    }

    fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("kv offline".to_string()))
    }

    fn scan_prefix(&self, _prefix: &str) -> Result<Vec<(String, Value)>, StoreError> {
        Err(StoreError::Unavailable("kv offline".to_string()))
    }

    fn set_if_prefix_empty(
        &self,
        _prefix: &str,
        _key: &str,
        _value: Value,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("kv offline".to_string()))
    }
}

/// Object storage that accepts uploads but can never sign a link.
pub(super) struct UnsignableStorage;

impl ObjectStorage for UnsignableStorage {
    fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, StorageError> {
        Ok(StoredObject {
            path: format!("{}/{}", upload.folder, upload.file_name),
        })
    }

    fn signed_url(&self, _path: &str, _ttl: Duration) -> Result<SignedUrl, StorageError> {
        Err(StorageError::Signing("hsm unreachable".to_string()))
    }

    fn fetch_signed(
        &self,
        _path: &str,
        _expires: i64,
        _signature: &str,
    ) -> Result<ObjectContent, StorageError> {
        Err(StorageError::InvalidSignature)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
