//! Bearer-token guard for protected routes.

use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use tracing::error;
use uuid::Uuid;

use crate::auth::{session, AuthState};

pub(crate) struct Principal {
    pub(crate) id: Uuid,
    /// The raw token, kept so logout can revoke it by hash.
    pub(crate) token: String,
}

/// Authenticate a request: extract the bearer token, validate signature and
/// expiry, and reject revoked tokens. A revoked token is invalid even when
/// cryptographically well-formed and unexpired.
pub(crate) async fn require_auth(
    headers: &HeaderMap,
    state: &AuthState,
) -> Result<Principal, StatusCode> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let claims = state
        .signer()
        .decode(&token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    match session::is_revoked(state.store(), &token).await {
        Ok(false) => Ok(Principal {
            id: claims.sub,
            token,
        }),
        Ok(true) => Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            error!("failed to check token revocation: {err:#}");

            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing;
    use crate::sms::RecordingSmsSender;
    use crate::users::MemoryUserStore;
    use axum::http::HeaderValue;
    use std::sync::Arc;

    fn state() -> AuthState {
        testing::state_with(
            Arc::new(MemoryUserStore::new()),
            Arc::new(RecordingSmsSender::new()),
        )
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn extract_bearer_token_handles_casing_and_whitespace() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers), Some("abc".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer  abc "));
        assert_eq!(extract_bearer_token(&headers), Some("abc".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn valid_token_resolves_to_a_principal() {
        let state = state();
        let id = Uuid::new_v4();
        let token = state.signer().mint(id, "alice", "+15005550006").unwrap();

        let principal = require_auth(&bearer_headers(&token), &state).await.unwrap();
        assert_eq!(principal.id, id);
        assert_eq!(principal.token, token);
    }

    #[tokio::test]
    async fn missing_or_garbage_tokens_are_unauthorized() {
        let state = state();

        let result = require_auth(&HeaderMap::new(), &state).await;
        assert!(matches!(result, Err(StatusCode::UNAUTHORIZED)));

        let result = require_auth(&bearer_headers("not-a-jwt"), &state).await;
        assert!(matches!(result, Err(StatusCode::UNAUTHORIZED)));
    }

    #[tokio::test]
    async fn revoked_token_is_unauthorized() {
        let state = state();
        let token = state
            .signer()
            .mint(Uuid::new_v4(), "alice", "+15005550006")
            .unwrap();

        session::revoke(state.store(), state.signer(), &token)
            .await
            .unwrap();

        let result = require_auth(&bearer_headers(&token), &state).await;
        assert!(matches!(result, Err(StatusCode::UNAUTHORIZED)));
    }
}
