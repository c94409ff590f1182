//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings, so the salt and cost parameters travel
//! with the hash and can be tuned without invalidating existing records.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::error;

use super::CryptoError;

/// Hash a plaintext password into a PHC string.
pub fn hash_password(plain: &str) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            error!("password hashing failed: {err}");

            CryptoError::Hash
        })
}

/// Verify a plaintext password against a stored PHC string.
///
/// A mismatch is `Ok(false)`; an unparseable stored hash is an error, since
/// it means the record is corrupt rather than the credential wrong.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, CryptoError> {
    let parsed = PasswordHash::new(stored).map_err(|err| {
        error!("stored password hash is not a valid PHC string: {err}");

        CryptoError::Malformed("password hash".to_string())
    })?;

    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
