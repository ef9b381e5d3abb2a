//! Object storage for uploaded permit documents and the signed links that
//! grant temporary read access to them.

mod memory;
pub mod router;
mod signing;

pub use memory::InMemoryObjectStorage;
pub use router::storage_router;
pub use signing::UrlSigner;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Content types accepted for permit documents.
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// Folder used when an upload does not name one.
pub const DEFAULT_FOLDER: &str = "misc";

/// File handed to the storage layer by the upload endpoint.
#[derive(Debug, Clone)]
pub struct ObjectUpload {
    pub folder: String,
    pub file_name: String,
    pub content_type: mime::Mime,
    pub bytes: Vec<u8>,
}

/// Location of a stored object inside its bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub path: String,
}

/// Bytes and metadata served back through a signed link.
#[derive(Debug, Clone)]
pub struct ObjectContent {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Time-limited capability link for a private object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Object storage seam; the workflows only need upload, signing and
/// signed reads.
pub trait ObjectStorage: Send + Sync {
    fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, StorageError>;

    fn signed_url(&self, path: &str, ttl: Duration) -> Result<SignedUrl, StorageError>;

    fn fetch_signed(
        &self,
        path: &str,
        expires: i64,
        signature: &str,
    ) -> Result<ObjectContent, StorageError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unsupported content type '{0}', expected JPEG, PNG or PDF")]
    UnsupportedContentType(String),
    #[error("file is {actual} bytes, the limit is {limit} bytes")]
    TooLarge { limit: usize, actual: usize },
    #[error("uploaded file is empty")]
    EmptyFile,
    #[error("folder name '{0}' may only contain letters, digits, '-' and '_'")]
    InvalidFolder(String),
    #[error("object not found")]
    NotFound,
    #[error("signed link is invalid")]
    InvalidSignature,
    #[error("signed link has expired")]
    Expired,
    #[error("failed to sign object link: {0}")]
    Signing(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Rejections caused by the uploaded content rather than the backend.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StorageError::UnsupportedContentType(_)
                | StorageError::TooLarge { .. }
                | StorageError::EmptyFile
                | StorageError::InvalidFolder(_)
        )
    }
}
