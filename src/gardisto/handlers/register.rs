//! Registration endpoint. The phone number is encrypted before it is stored;
//! plaintext never reaches the database.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::auth::{error::AuthError, AuthState};
use crate::crypto::password::hash_password;
use crate::users::{CreateOutcome, UserStore};

use super::types::{ErrorResponse, MessageResponse, RegisterRequest};
use super::{bad_request, decode_request};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Missing fields or duplicate username", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<Value>>,
) -> Response {
    let Some(Json(body)) = payload else {
        return bad_request("Missing payload.");
    };

    let request: RegisterRequest = match decode_request(&state, body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    if request.username.trim().is_empty()
        || request.password.is_empty()
        || request.phone.trim().is_empty()
    {
        return bad_request("Username, password, and phone are required.");
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => return AuthError::confidentiality(err).into_response(),
    };

    let encrypted_phone = match state.field_cipher().encrypt(request.phone.trim()) {
        Ok(blob) => blob,
        Err(err) => return AuthError::confidentiality(err).into_response(),
    };

    match state
        .users()
        .create(request.username.trim(), &password_hash, &encrypted_phone)
        .await
    {
        Ok(CreateOutcome::Created) => (
            StatusCode::CREATED,
            Json(MessageResponse::new("User created successfully.")),
        )
            .into_response(),
        Ok(CreateOutcome::Conflict) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Username already registered. Choose another.",
            )),
        )
            .into_response(),
        Err(err) => AuthError::dependency(err).into_response(),
    }
}
