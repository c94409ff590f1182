pub mod health;
pub use self::health::health;

pub mod register;
pub use self::register::register;

pub mod login;
pub use self::login::login;

pub mod verify;
pub use self::verify::verify;

pub mod logout;
pub use self::logout::logout;

pub mod change_password;
pub use self::change_password::change_password;

pub mod principal;
pub mod types;

// common functions for the handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::auth::AuthState;
use crate::crypto::{transport, TransportPayload};

use self::types::ErrorResponse;

/// Decode a request body that is either plain JSON or wrapped in an
/// encrypted transport envelope. Envelopes are detected structurally,
/// decrypted, and parsed; everything else deserializes directly.
pub(crate) fn decode_request<T: DeserializeOwned>(
    state: &AuthState,
    body: Value,
) -> Result<T, Response> {
    let value = if TransportPayload::looks_like(&body) {
        let payload: TransportPayload = serde_json::from_value(body)
            .map_err(|_| bad_request("Invalid transport payload."))?;

        let plain = state.transport_cipher().decrypt(&payload).map_err(|err| {
            warn!("transport payload decryption failed: {err}");

            bad_request("Invalid transport payload.")
        })?;

        transport::parse_decrypted(&plain)
    } else {
        body
    };

    serde_json::from_value(value).map_err(|_| bad_request("Missing or invalid payload."))
}

pub(crate) fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}
