//! Login endpoint: first factor of the two-step flow.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::auth::{login::LoginOutcome, AuthState};

use super::types::{ErrorResponse, LoginRequest, LoginResponse};
use super::{bad_request, decode_request};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Password verified; second factor required", body = LoginResponse),
        (status = 401, description = "Invalid credentials, with remaining attempts", body = ErrorResponse),
        (status = 429, description = "Attempt limit reached", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    Extension(state): Extension<Arc<AuthState>>,
    payload: Option<Json<Value>>,
) -> Response {
    let Some(Json(body)) = payload else {
        return bad_request("Missing payload.");
    };

    let request: LoginRequest = match decode_request(&state, body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match crate::auth::login::login(&state, &request.username, &request.password).await {
        Ok(LoginOutcome::ChallengeIssued { user }) => (
            StatusCode::OK,
            Json(LoginResponse {
                message: "Verification code sent by SMS.".to_string(),
                requires_2fa: true,
                user,
            }),
        )
            .into_response(),
        Ok(LoginOutcome::Rejected { remaining }) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::with_remaining(
                format!("Invalid credentials. {remaining} attempt(s) remaining."),
                remaining,
            )),
        )
            .into_response(),
        Ok(LoginOutcome::Blocked) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(
                "Too many attempts. Wait a few minutes and try again.",
            )),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
