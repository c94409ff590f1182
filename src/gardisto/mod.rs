//! HTTP surface: state wiring, router, and server bootstrap.

pub mod handlers;
pub mod openapi;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{session::TokenSigner, AuthConfig, AuthState};
use crate::cli::globals::{GlobalArgs, SmsProvider};
use crate::crypto::{FieldCipher, TransportCipher};
use crate::sms::{LogSmsSender, SmsSender, TwilioSender};
use crate::store::MemoryStore;
use crate::users::PgUserStore;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "",
};

/// Keep store calls bounded so an outage degrades to an error instead of a
/// hung request.
const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

/// Build the state, bind the listener, and serve until shutdown.
pub async fn new(port: u16, dsn: String, globals: &GlobalArgs) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(DB_ACQUIRE_TIMEOUT)
        .connect(&dsn)
        .await
        .context("failed to connect to the user store")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    let state = build_state(globals, pool)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    let app = router(Arc::new(state));

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Assemble auth state from startup secrets. Fails fast on a bad key so a
/// misconfigured process never accepts requests.
pub fn build_state(globals: &GlobalArgs, pool: PgPool) -> Result<AuthState> {
    let field_cipher =
        FieldCipher::new(&globals.field_key).context("invalid field encryption key")?;
    let transport_cipher =
        TransportCipher::new(&globals.transport_key).context("invalid transport encryption key")?;
    let signer = TokenSigner::new(&globals.token_secret, globals.token_ttl_seconds);

    Ok(AuthState::new(
        AuthConfig::new(),
        field_cipher,
        transport_cipher,
        signer,
        Arc::new(MemoryStore::new()),
        Arc::new(PgUserStore::new(pool)),
        sms_sender(globals)?,
    ))
}

fn sms_sender(globals: &GlobalArgs) -> Result<Arc<dyn SmsSender>> {
    match globals.sms_provider {
        SmsProvider::Log => {
            warn!("using the log SMS sender; verification codes will not be delivered");

            Ok(Arc::new(LogSmsSender))
        }
        SmsProvider::Twilio => {
            let account_sid = globals
                .twilio_account_sid
                .clone()
                .context("twilio account sid is not configured")?;
            let auth_token = globals
                .twilio_auth_token
                .clone()
                .context("twilio auth token is not configured")?;
            let from = globals
                .twilio_from
                .clone()
                .context("twilio sender number is not configured")?;

            Ok(Arc::new(TwilioSender::new(account_sid, auth_token, from)?))
        }
    }
}

pub fn router(state: Arc<AuthState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/v1/docs").url("/v1/openapi.json", openapi::ApiDoc::openapi()))
        .route("/health", get(handlers::health))
        .route("/v1/auth/register", post(handlers::register))
        .route("/v1/auth/login", post(handlers::login))
        .route("/v1/auth/verify", post(handlers::verify))
        .route("/v1/auth/logout", post(handlers::logout))
        .route("/v1/auth/password", post(handlers::change_password))
        .layer(Extension(state))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
