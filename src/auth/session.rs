//! Session token issuing and the revocation registry.
//!
//! Tokens are HS256 JWTs signed with a process-wide secret. They are never
//! persisted; logout writes the token's SHA-256 hash into the coordination
//! store for the remainder of the token's lifetime, and the request guard
//! treats the presence of that entry as unconditional invalidation.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::crypto::hash_token;
use crate::store::CoordinationStore;

use super::{error::AuthError, revoked_token_key};

/// Grace TTL for a token revoked at or past its own expiry; covers the
/// clock-skew race where a still-circulating token would otherwise escape
/// the registry.
const REVOCATION_GRACE: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub phone: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            ttl_seconds,
        }
    }

    pub fn mint(
        &self,
        id: Uuid,
        username: &str,
        phone: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: id,
            username: username.to_string(),
            phone: phone.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };

        encode(&Header::default(), &claims, &self.encoding)
    }

    /// Decode with full validation: signature and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
    }

    /// Decode for revocation: the signature and the presence of `exp` are
    /// still required, but an already-expired token is accepted so a late
    /// logout does not error.
    fn decode_allow_expired(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

/// Blacklist a token until its natural expiry. Idempotent: revoking an
/// already-revoked token rewrites the entry.
pub async fn revoke(
    store: &dyn CoordinationStore,
    signer: &TokenSigner,
    token: &str,
) -> Result<(), AuthError> {
    let claims = signer
        .decode_allow_expired(token)
        .map_err(|_| AuthError::Validation("malformed token".to_string()))?;

    let ttl = match u64::try_from(claims.exp - Utc::now().timestamp()) {
        Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
        _ => REVOCATION_GRACE,
    };

    let key = revoked_token_key(&hash_token(token));
    store
        .set_with_expiry(&key, "true", ttl)
        .await
        .map_err(AuthError::dependency)
}

/// Whether a token has been revoked. Presence in the registry invalidates
/// the token even if it is cryptographically well-formed and unexpired.
pub async fn is_revoked(store: &dyn CoordinationStore, token: &str) -> anyhow::Result<bool> {
    let key = revoked_token_key(&hash_token(token));

    Ok(store.get(&key).await?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tokio::time::advance;

    fn signer_with_ttl(ttl_seconds: i64) -> TokenSigner {
        TokenSigner::new(
            &SecretString::from("test-signing-secret".to_string()),
            ttl_seconds,
        )
    }

    #[test]
    fn mint_decode_round_trip() {
        let signer = signer_with_ttl(3600);
        let id = Uuid::new_v4();

        let token = signer.mint(id, "alice", "+15005550006").unwrap();
        let claims = signer.decode(&token).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.phone, "+15005550006");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn decode_rejects_wrong_secret_and_garbage() {
        let signer = signer_with_ttl(3600);
        let other = TokenSigner::new(&SecretString::from("other-secret".to_string()), 3600);

        let token = signer.mint(Uuid::new_v4(), "alice", "+15005550006").unwrap();

        assert!(other.decode(&token).is_err());
        assert!(signer.decode("not-a-jwt").is_err());
    }

    #[test]
    fn decode_rejects_expired_tokens() {
        // Expired well past the library's default leeway.
        let signer = signer_with_ttl(-3600);
        let token = signer.mint(Uuid::new_v4(), "alice", "+15005550006").unwrap();

        assert!(signer.decode(&token).is_err());
    }

    #[tokio::test]
    async fn revoke_blacklists_the_token() {
        let store = MemoryStore::new();
        let signer = signer_with_ttl(3600);
        let token = signer.mint(Uuid::new_v4(), "alice", "+15005550006").unwrap();

        assert!(!is_revoked(&store, &token).await.unwrap());

        revoke(&store, &signer, &token).await.unwrap();
        assert!(is_revoked(&store, &token).await.unwrap());

        // Other tokens are untouched.
        let other = signer.mint(Uuid::new_v4(), "bob", "+15005550007").unwrap();
        assert!(!is_revoked(&store, &other).await.unwrap());
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let store = MemoryStore::new();
        let signer = signer_with_ttl(3600);
        let token = signer.mint(Uuid::new_v4(), "alice", "+15005550006").unwrap();

        revoke(&store, &signer, &token).await.unwrap();
        revoke(&store, &signer, &token).await.unwrap();

        assert!(is_revoked(&store, &token).await.unwrap());
    }

    #[tokio::test]
    async fn revoking_an_expired_token_gets_a_grace_entry() {
        let store = MemoryStore::new();
        let signer = signer_with_ttl(-10);
        let token = signer.mint(Uuid::new_v4(), "alice", "+15005550006").unwrap();

        revoke(&store, &signer, &token).await.unwrap();
        assert!(is_revoked(&store, &token).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let store = MemoryStore::new();
        let signer = signer_with_ttl(3600);

        let result = revoke(&store, &signer, "definitely-not-a-jwt").await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn revocation_entry_expires_with_the_token() {
        let store = MemoryStore::new();
        let signer = signer_with_ttl(3600);
        let token = signer.mint(Uuid::new_v4(), "alice", "+15005550006").unwrap();

        revoke(&store, &signer, &token).await.unwrap();

        // The registry entry lives no longer than the token itself.
        advance(Duration::from_secs(3601)).await;
        assert!(!is_revoked(&store, &token).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn grace_entry_expires_after_a_minute() {
        let store = MemoryStore::new();
        let signer = signer_with_ttl(-10);
        let token = signer.mint(Uuid::new_v4(), "alice", "+15005550006").unwrap();

        revoke(&store, &signer, &token).await.unwrap();

        advance(Duration::from_secs(61)).await;
        assert!(!is_revoked(&store, &token).await.unwrap());
    }
}
