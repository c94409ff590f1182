//! One-way hashing for session token identifiers.
//!
//! The revocation registry stores only this hash, so the coordination store
//! never holds a live bearer token.

use sha2::{Digest, Sha256};

/// Hash a session token for revocation-set membership.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_distinct() {
        let first = hash_token("token");
        let second = hash_token("token");
        let other = hash_token("other");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn hash_is_sha256_hex() {
        let hash = hash_token("anything");

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_does_not_contain_the_token() {
        let token = "very-secret-bearer-token";
        assert!(!hash_token(token).contains(token));
    }
}
