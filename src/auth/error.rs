//! Error taxonomy for the auth flows.
//!
//! Recoverable conditions (wrong credential, rate limit, malformed input)
//! are outcome variants on the individual flows, not errors. What lands
//! here is the fatal remainder: confidentiality failures and unavailable
//! collaborators. Those are logged with full detail server-side and
//! surfaced to the caller as an opaque internal error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input rejected before any side effect.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Decryption, hashing, or signing failure. Wrong key or corrupt data,
    /// never a wrong credential.
    #[error("confidentiality failure")]
    Confidentiality(#[source] anyhow::Error),

    /// Coordination store or user store unavailable.
    #[error("dependency failure")]
    Dependency(#[source] anyhow::Error),

    /// SMS delivery failed after the challenge was staged; the challenge
    /// has been rolled back.
    #[error("code delivery failure")]
    Delivery(#[source] anyhow::Error),
}

impl AuthError {
    pub(crate) fn confidentiality(err: impl Into<anyhow::Error>) -> Self {
        Self::Confidentiality(err.into())
    }

    pub(crate) fn dependency(err: impl Into<anyhow::Error>) -> Self {
        Self::Dependency(err.into())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::Delivery(err) => {
                error!("verification code delivery failed: {err:#}");

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Could not send the verification code. Try again." })),
                )
                    .into_response()
            }
            Self::Confidentiality(err) => {
                error!("confidentiality failure: {err:#}");

                internal_error()
            }
            Self::Dependency(err) => {
                error!("dependency failure: {err:#}");

                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal error." })),
    )
        .into_response()
}
