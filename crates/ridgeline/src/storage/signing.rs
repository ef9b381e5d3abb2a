use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::StorageError;

type HmacSha256 = Hmac<Sha256>;

/// Longest signature we bother decoding; a SHA-256 MAC is 43 chars unpadded.
const MAX_SIGNATURE_LEN: usize = 128;

/// Mints and checks capability signatures for `bucket/path` until `expires`.
#[derive(Clone)]
pub struct UrlSigner {
    key: Vec<u8>,
    bucket: String,
}

impl UrlSigner {
    pub fn new(key: impl Into<Vec<u8>>, bucket: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            bucket: bucket.into(),
        }
    }

    fn mac(&self, path: &str, expires: i64) -> Result<HmacSha256, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|err| StorageError::Signing(err.to_string()))?;
        mac.update(self.bucket.as_bytes());
        mac.update(b"\n");
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    pub fn sign(&self, path: &str, expires: i64) -> Result<String, StorageError> {
        let mac = self.mac(path, expires)?;
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    /// Constant-time check of `signature` against `path` and `expires`.
    pub fn verify(&self, path: &str, expires: i64, signature: &str) -> bool {
        if signature.len() > MAX_SIGNATURE_LEN {
            return false;
        }
        let Ok(raw) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        self.mac(path, expires)
            .is_ok_and(|mac| mac.verify_slice(&raw).is_ok())
    }
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}
