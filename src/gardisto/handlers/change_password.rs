//! Password change endpoint for an authenticated session.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::auth::{password, password::ChangePasswordOutcome, AuthState};

use super::principal::require_auth;
use super::types::{ChangePasswordRequest, ErrorResponse, MessageResponse};
use super::{bad_request, decode_request};

#[utoipa::path(
    post,
    path = "/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Missing/invalid token or wrong current password", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn change_password(
    Extension(state): Extension<Arc<AuthState>>,
    headers: HeaderMap,
    payload: Option<Json<Value>>,
) -> Response {
    let principal = match require_auth(&headers, &state).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let Some(Json(body)) = payload else {
        return bad_request("Missing payload.");
    };

    let request: ChangePasswordRequest = match decode_request(&state, body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match password::change_password(
        &state,
        principal.id,
        &request.old_password,
        &request.new_password,
    )
    .await
    {
        Ok(ChangePasswordOutcome::Updated) => (
            StatusCode::OK,
            Json(MessageResponse::new("Password changed successfully.")),
        )
            .into_response(),
        Ok(ChangePasswordOutcome::WrongPassword) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Current password is incorrect.")),
        )
            .into_response(),
        Ok(ChangePasswordOutcome::UserMissing) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("User not found.")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
