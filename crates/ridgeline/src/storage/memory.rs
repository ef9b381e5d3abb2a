use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use super::signing::UrlSigner;
use super::{
    ObjectContent, ObjectStorage, ObjectUpload, SignedUrl, StorageError, StoredObject,
    ALLOWED_CONTENT_TYPES, DEFAULT_FOLDER,
};

#[derive(Debug, Clone)]
struct StoredBlob {
    content_type: String,
    bytes: Vec<u8>,
}

/// Private bucket held in process memory, served through HMAC-signed links.
#[derive(Debug, Clone)]
pub struct InMemoryObjectStorage {
    signer: UrlSigner,
    url_base: String,
    max_bytes: usize,
    objects: Arc<Mutex<HashMap<String, StoredBlob>>>,
}

impl InMemoryObjectStorage {
    /// `url_base` is the externally reachable prefix objects are served under.
    pub fn new(signer: UrlSigner, url_base: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            signer,
            url_base: url_base.into().trim_end_matches('/').to_string(),
            max_bytes,
            objects: Arc::default(),
        }
    }

    fn objects(&self) -> Result<MutexGuard<'_, HashMap<String, StoredBlob>>, StorageError> {
        self.objects
            .lock()
            .map_err(|_| StorageError::Unavailable("bucket lock poisoned".to_string()))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects()
            .map(|guard| guard.contains_key(path))
            .unwrap_or(false)
    }
}

fn sanitize_folder(raw: &str) -> Result<String, StorageError> {
    let folder = raw.trim().trim_matches('/');
    if folder.is_empty() {
        return Ok(DEFAULT_FOLDER.to_string());
    }
    if folder
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(folder.to_string())
    } else {
        Err(StorageError::InvalidFolder(raw.to_string()))
    }
}

fn extension_for(file_name: &str, content_type: &mime::Mime) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.unwrap_or_else(|| match content_type.essence_str() {
        "application/pdf" => "pdf".to_string(),
        "image/png" => "png".to_string(),
        _ => "jpg".to_string(),
    })
}

impl ObjectStorage for InMemoryObjectStorage {
    fn upload(&self, upload: ObjectUpload) -> Result<StoredObject, StorageError> {
        let essence = upload.content_type.essence_str().to_string();
        if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
            return Err(StorageError::UnsupportedContentType(essence));
        }
        if upload.bytes.is_empty() {
            return Err(StorageError::EmptyFile);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                limit: self.max_bytes,
                actual: upload.bytes.len(),
            });
        }

        let folder = sanitize_folder(&upload.folder)?;
        let extension = extension_for(&upload.file_name, &upload.content_type);
        let path = format!("{folder}/{}.{extension}", Uuid::new_v4());

        self.objects()?.insert(
            path.clone(),
            StoredBlob {
                content_type: essence,
                bytes: upload.bytes,
            },
        );
        debug!(%path, "stored object");

        Ok(StoredObject { path })
    }

    fn signed_url(&self, path: &str, ttl: Duration) -> Result<SignedUrl, StorageError> {
        if !self.objects()?.contains_key(path) {
            return Err(StorageError::NotFound);
        }

        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| StorageError::Signing("link lifetime out of range".to_string()))?;
        let expires = expires_at.timestamp();
        let signature = self.signer.sign(path, expires)?;

        Ok(SignedUrl {
            url: format!(
                "{}/{path}?expires={expires}&signature={signature}",
                self.url_base
            ),
            expires_at,
        })
    }

    fn fetch_signed(
        &self,
        path: &str,
        expires: i64,
        signature: &str,
    ) -> Result<ObjectContent, StorageError> {
        if !self.signer.verify(path, expires, signature) {
            return Err(StorageError::InvalidSignature);
        }
        if Utc::now().timestamp() > expires {
            return Err(StorageError::Expired);
        }

        let guard = self.objects()?;
        let blob = guard.get(path).ok_or(StorageError::NotFound)?;
        Ok(ObjectContent {
            content_type: blob.content_type.clone(),
            bytes: blob.bytes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(max_bytes: usize) -> InMemoryObjectStorage {
        InMemoryObjectStorage::new(
            UrlSigner::new(b"test-signing-key-test-signing-key".to_vec(), "permits"),
            "http://localhost:3000/api/v1/storage/objects/",
            max_bytes,
        )
    }

    fn pdf(folder: &str, bytes: &[u8]) -> ObjectUpload {
        ObjectUpload {
            folder: folder.to_string(),
            file_name: "licence.PDF".to_string(),
            content_type: mime::APPLICATION_PDF,
            bytes: bytes.to_vec(),
        }
    }

    /// Splits a signed URL into (path, expires, signature).
    fn parse_signed(url: &str) -> (String, i64, String) {
        let rest = url
            .strip_prefix("http://localhost:3000/api/v1/storage/objects/")
            .expect("url uses configured base");
        let (path, query) = rest.split_once('?').expect("query present");
        let mut expires = 0;
        let mut signature = String::new();
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", value)) => expires = value.parse().expect("numeric expiry"),
                Some(("signature", value)) => signature = value.to_string(),
                _ => {}
            }
        }
        (path.to_string(), expires, signature)
    }

    #[test]
    fn upload_places_object_under_folder_with_extension() {
        let storage = storage(1024);
        let stored = storage.upload(pdf("permits", b"%PDF-1.7")).expect("upload");

        assert!(stored.path.starts_with("permits/"));
        assert!(stored.path.ends_with(".pdf"));
        assert!(storage.contains(&stored.path));
    }

    #[test]
    fn upload_defaults_folder_and_rejects_traversal() {
        let storage = storage(1024);
        let stored = storage.upload(pdf("", b"%PDF")).expect("upload");
        assert!(stored.path.starts_with("misc/"));

        assert!(matches!(
            storage.upload(pdf("../etc", b"%PDF")),
            Err(StorageError::InvalidFolder(_))
        ));
    }

    #[test]
    fn upload_enforces_type_and_size() {
        let storage = storage(4);
        let mut upload = pdf("permits", b"%PDF");
        upload.content_type = mime::TEXT_PLAIN;
        assert!(matches!(
            storage.upload(upload),
            Err(StorageError::UnsupportedContentType(ref ct)) if ct == "text/plain"
        ));

        assert!(matches!(
            storage.upload(pdf("permits", b"%PDF-1.7")),
            Err(StorageError::TooLarge { limit: 4, actual: 8 })
        ));
        assert!(matches!(
            storage.upload(pdf("permits", b"")),
            Err(StorageError::EmptyFile)
        ));
    }

    #[test]
    fn signed_url_round_trips_through_fetch() {
        let storage = storage(1024);
        let stored = storage.upload(pdf("permits", b"%PDF-1.7")).expect("upload");
        let signed = storage
            .signed_url(&stored.path, Duration::hours(1))
            .expect("sign");

        assert_ne!(signed.url, stored.path);
        let (path, expires, signature) = parse_signed(&signed.url);
        assert_eq!(path, stored.path);
        assert_eq!(expires, signed.expires_at.timestamp());

        let content = storage
            .fetch_signed(&path, expires, &signature)
            .expect("fetch with valid signature");
        assert_eq!(content.content_type, "application/pdf");
        assert_eq!(content.bytes, b"%PDF-1.7");

        assert!(matches!(
            storage.fetch_signed(&path, expires + 60, &signature),
            Err(StorageError::InvalidSignature)
        ));
    }

    #[test]
    fn expired_links_are_refused() {
        let storage = storage(1024);
        let stored = storage.upload(pdf("permits", b"%PDF")).expect("upload");
        let signed = storage
            .signed_url(&stored.path, Duration::seconds(-5))
            .expect("sign");
        let (path, expires, signature) = parse_signed(&signed.url);

        assert!(matches!(
            storage.fetch_signed(&path, expires, &signature),
            Err(StorageError::Expired)
        ));
    }

    #[test]
    fn signing_unknown_object_is_not_found() {
        let storage = storage(1024);
        assert!(matches!(
            storage.signed_url("permits/missing.pdf", Duration::hours(1)),
            Err(StorageError::NotFound)
        ));
    }

    #[test]
    fn unbounded_link_lifetime_is_an_error_not_a_panic() {
        let storage = storage(1024);
        let stored = storage.upload(pdf("permits", b"%PDF")).expect("upload");
        assert!(matches!(
            storage.signed_url(&stored.path, Duration::MAX),
            Err(StorageError::Signing(_))
        ));
    }
}
