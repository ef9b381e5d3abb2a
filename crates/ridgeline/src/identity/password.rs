//! Password hashing and verification using Argon2id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use super::IdentityError;

/// Hash a plaintext password into a PHC-format string.
pub(crate) fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Crypto(format!("hash error: {e}")))
}

/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(IdentityError::Crypto)` if the stored hash is malformed.
pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool, IdentityError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| IdentityError::Crypto(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(IdentityError::Crypto(format!("verify error: {e}"))),
    }
}
