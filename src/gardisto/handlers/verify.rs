//! Code verification endpoint: second factor of the two-step flow.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::auth::{mfa, mfa::MfaOutcome, AuthState};

use super::types::{ErrorResponse, VerifyRequest, VerifyResponse};
use super::{bad_request, decode_request};

#[utoipa::path(
    post,
    path = "/v1/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Code accepted; session token issued", body = VerifyResponse),
        (status = 400, description = "Malformed code or expired challenge", body = ErrorResponse),
        (status = 401, description = "Wrong code, with remaining attempts", body = ErrorResponse),
        (status = 429, description = "Attempt limit reached", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<Value>>,
) -> Response {
    let Some(Json(body)) = payload else {
        return bad_request("Missing payload.");
    };

    let request: VerifyRequest = match decode_request(&state, body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match mfa::verify(&state, &request.username, &request.code).await {
        Ok(MfaOutcome::Authenticated { token, user }) => (
            StatusCode::OK,
            Json(VerifyResponse {
                message: "Two-step verification completed successfully.".to_string(),
                token,
                user,
            }),
        )
            .into_response(),
        Ok(MfaOutcome::Malformed) => bad_request("Invalid verification code."),
        Ok(MfaOutcome::Expired) => {
            bad_request("Code expired or not found. Request a new login.")
        }
        Ok(MfaOutcome::UnknownUser) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid credentials.")),
        )
            .into_response(),
        Ok(MfaOutcome::Retry { remaining }) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::with_remaining(
                format!("Invalid verification code. {remaining} attempt(s) remaining."),
                remaining,
            )),
        )
            .into_response(),
        Ok(MfaOutcome::Blocked) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(
                "Too many attempts. Start the login again.",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
