//! Core authentication flows.
//!
//! Flow overview:
//! 1) `login` checks the per-username attempt counter, verifies the
//!    password, and stages an SMS one-time code (the MFA challenge).
//! 2) `mfa::verify` checks the submitted code against the cached challenge
//!    under its own attempt counter and mints a bearer session token.
//! 3) `session::revoke` blacklists a token by hash until its natural expiry.
//!
//! Every branch is an explicit outcome variant rather than a status code, so
//! the HTTP layer cannot mishandle an unanticipated path.

pub mod error;
pub mod login;
pub mod mfa;
pub mod password;
pub mod rate_limit;
pub mod session;

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::crypto::{FieldCipher, TransportCipher};
use crate::sms::SmsSender;
use crate::store::CoordinationStore;
use crate::users::UserStore;

use self::rate_limit::AttemptLimiter;
use self::session::TokenSigner;

const DEFAULT_LOGIN_MAX_ATTEMPTS: u64 = 3;
const DEFAULT_LOGIN_WINDOW_SECONDS: u64 = 300;
const DEFAULT_MFA_MAX_ATTEMPTS: u64 = 3;
const DEFAULT_MFA_WINDOW_SECONDS: u64 = 120;
const DEFAULT_CHALLENGE_TTL_SECONDS: u64 = 120;

/// Non-secret user fields returned by the login and verification flows.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub phone: String,
}

/// Thresholds and windows for the auth flows.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    login_max_attempts: u64,
    login_window: Duration,
    mfa_max_attempts: u64,
    mfa_window: Duration,
    challenge_ttl: Duration,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            login_max_attempts: DEFAULT_LOGIN_MAX_ATTEMPTS,
            login_window: Duration::from_secs(DEFAULT_LOGIN_WINDOW_SECONDS),
            mfa_max_attempts: DEFAULT_MFA_MAX_ATTEMPTS,
            mfa_window: Duration::from_secs(DEFAULT_MFA_WINDOW_SECONDS),
            challenge_ttl: Duration::from_secs(DEFAULT_CHALLENGE_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_login_window_seconds(mut self, seconds: u64) -> Self {
        self.login_window = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_mfa_window_seconds(mut self, seconds: u64) -> Self {
        self.mfa_window = Duration::from_secs(seconds);
        self
    }

    #[must_use]
    pub fn with_challenge_ttl_seconds(mut self, seconds: u64) -> Self {
        self.challenge_ttl = Duration::from_secs(seconds);
        self
    }

    pub(crate) fn challenge_ttl(&self) -> Duration {
        self.challenge_ttl
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state for the auth flows: policy, keys, and collaborators.
pub struct AuthState {
    config: AuthConfig,
    field_cipher: FieldCipher,
    transport_cipher: TransportCipher,
    signer: TokenSigner,
    store: Arc<dyn CoordinationStore>,
    users: Arc<dyn UserStore>,
    sms: Arc<dyn SmsSender>,
    login_limiter: AttemptLimiter,
    mfa_limiter: AttemptLimiter,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        field_cipher: FieldCipher,
        transport_cipher: TransportCipher,
        signer: TokenSigner,
        store: Arc<dyn CoordinationStore>,
        users: Arc<dyn UserStore>,
        sms: Arc<dyn SmsSender>,
    ) -> Self {
        let login_limiter = AttemptLimiter::new(config.login_max_attempts, config.login_window);
        let mfa_limiter = AttemptLimiter::new(config.mfa_max_attempts, config.mfa_window);

        Self {
            config,
            field_cipher,
            transport_cipher,
            signer,
            store,
            users,
            sms,
            login_limiter,
            mfa_limiter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn field_cipher(&self) -> &FieldCipher {
        &self.field_cipher
    }

    #[must_use]
    pub fn transport_cipher(&self) -> &TransportCipher {
        &self.transport_cipher
    }

    #[must_use]
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub(crate) fn store(&self) -> &dyn CoordinationStore {
        self.store.as_ref()
    }

    pub(crate) fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub(crate) fn sms(&self) -> &dyn SmsSender {
        self.sms.as_ref()
    }

    pub(crate) fn login_limiter(&self) -> &AttemptLimiter {
        &self.login_limiter
    }

    pub(crate) fn mfa_limiter(&self) -> &AttemptLimiter {
        &self.mfa_limiter
    }
}

// Key formats in the coordination store. The login counter is keyed by the
// lower-cased username so casing games cannot dodge the limiter; the actual
// user lookup stays case-sensitive.

pub(crate) fn login_attempts_key(username: &str) -> String {
    format!("auth:login:{}:attempts", username.to_lowercase())
}

pub(crate) fn challenge_key(user_id: Uuid) -> String {
    format!("mfa:login:{user_id}")
}

pub(crate) fn mfa_attempts_key(user_id: Uuid) -> String {
    format!("mfa:login:{user_id}:attempts")
}

pub(crate) fn revoked_token_key(token_hash: &str) -> String {
    format!("blacklist:token:{token_hash}")
}

/// Delete a coordination key without letting a store failure fail the
/// surrounding operation.
pub(crate) async fn best_effort_delete(store: &dyn CoordinationStore, key: &str) {
    if let Err(err) = store.delete(key).await {
        warn!("failed to delete coordination key {key}: {err:#}");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::store::MemoryStore;
    use crate::users::MemoryUserStore;
    use secrecy::SecretString;

    pub(crate) fn field_cipher() -> FieldCipher {
        FieldCipher::new(&SecretString::from("11".repeat(32))).unwrap()
    }

    pub(crate) fn signer() -> TokenSigner {
        TokenSigner::new(&SecretString::from("test-signing-secret".to_string()), 3600)
    }

    pub(crate) fn state_with(users: Arc<dyn UserStore>, sms: Arc<dyn SmsSender>) -> AuthState {
        AuthState::new(
            AuthConfig::new(),
            field_cipher(),
            TransportCipher::new(&SecretString::from("22".repeat(32))).unwrap(),
            signer(),
            Arc::new(MemoryStore::new()),
            users,
            sms,
        )
    }

    /// Register a user the way the register handler would.
    pub(crate) async fn seed_user(users: &MemoryUserStore, username: &str, password: &str, phone: &str) {
        let hash = crate::crypto::password::hash_password(password).unwrap();
        let blob = field_cipher().encrypt(phone).unwrap();
        users.create(username, &hash, &blob).await.unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new();
        assert_eq!(config.login_max_attempts, 3);
        assert_eq!(config.login_window, Duration::from_secs(300));
        assert_eq!(config.mfa_window, Duration::from_secs(120));
        assert_eq!(config.challenge_ttl(), Duration::from_secs(120));

        let config = config
            .with_login_window_seconds(60)
            .with_mfa_window_seconds(30)
            .with_challenge_ttl_seconds(45);

        assert_eq!(config.login_window, Duration::from_secs(60));
        assert_eq!(config.mfa_window, Duration::from_secs(30));
        assert_eq!(config.challenge_ttl(), Duration::from_secs(45));
    }

    #[test]
    fn login_attempts_key_is_case_folded() {
        assert_eq!(
            login_attempts_key("Alice"),
            "auth:login:alice:attempts"
        );
        assert_eq!(login_attempts_key("alice"), login_attempts_key("ALICE"));
    }

    #[test]
    fn store_keys_have_distinct_namespaces() {
        let id = Uuid::nil();
        assert_eq!(challenge_key(id), format!("mfa:login:{id}"));
        assert_eq!(mfa_attempts_key(id), format!("mfa:login:{id}:attempts"));
        assert_eq!(
            revoked_token_key("abc123"),
            "blacklist:token:abc123"
        );
    }
}
