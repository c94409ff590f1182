//! Service health: name, version, and build metadata.

use axum::{
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::gardisto::GIT_COMMIT_HASH;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service name, version, and build")
    ),
    tag = "health"
)]
pub async fn health() -> impl IntoResponse {
    let short_hash = GIT_COMMIT_HASH.get(..7).unwrap_or_default();

    let mut headers = HeaderMap::new();
    if let Ok(app) = format!(
        "{}:{}:{short_hash}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
    .parse()
    {
        headers.insert("X-App", app);
    }

    (
        headers,
        Json(json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "build": GIT_COMMIT_HASH,
        })),
    )
}
