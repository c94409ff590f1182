//! OpenAPI document for the HTTP surface, served by the Swagger UI route.

use utoipa::OpenApi;

use crate::auth::UserSummary;
use crate::crypto::TransportPayload;

use super::handlers::types::{
    ChangePasswordRequest, ErrorResponse, LoginRequest, LoginResponse, MessageResponse,
    RegisterRequest, VerifyRequest, VerifyResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::health::health,
        super::handlers::register::register,
        super::handlers::login::login,
        super::handlers::verify::verify,
        super::handlers::logout::logout,
        super::handlers::change_password::change_password,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        VerifyRequest,
        VerifyResponse,
        ChangePasswordRequest,
        MessageResponse,
        ErrorResponse,
        UserSummary,
        TransportPayload,
    )),
    tags(
        (name = "auth", description = "Password and SMS two-factor authentication"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
