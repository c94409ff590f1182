//! Logout endpoint: blacklists the presented token until it would have
//! expired on its own.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use crate::auth::{session, AuthState};

use super::principal::require_auth;
use super::types::MessageResponse;

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 400, description = "Malformed token"),
        (status = 401, description = "Missing, invalid, or already revoked token")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(
    Extension(state): Extension<Arc<AuthState>>,
    headers: HeaderMap,
) -> Response {
    let principal = match require_auth(&headers, &state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match session::revoke(state.store(), state.signer(), &principal.token).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Logout successful. Token invalidated.")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
