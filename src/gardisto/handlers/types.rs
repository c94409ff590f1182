//! Request and response bodies for the auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::UserSummary;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    pub username: String,
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    #[serde(rename = "requires2FA")]
    pub requires_2fa: bool,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}

impl ErrorResponse {
    pub(crate) fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            remaining: None,
        }
    }

    pub(crate) fn with_remaining(error: impl Into<String>, remaining: u64) -> Self {
        Self {
            error: error.into(),
            remaining: Some(remaining),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_uses_the_wire_field_name() {
        let value = serde_json::to_value(LoginResponse {
            message: "ok".to_string(),
            requires_2fa: true,
            user: UserSummary {
                id: "1".to_string(),
                username: "alice".to_string(),
                phone: "+15005550006".to_string(),
            },
        })
        .unwrap();

        assert_eq!(value["requires2FA"], serde_json::json!(true));
        assert_eq!(value["user"]["username"], serde_json::json!("alice"));
    }

    #[test]
    fn error_response_omits_remaining_when_absent() {
        let value = serde_json::to_value(ErrorResponse::new("nope")).unwrap();
        assert!(value.get("remaining").is_none());

        let value = serde_json::to_value(ErrorResponse::with_remaining("nope", 2)).unwrap();
        assert_eq!(value["remaining"], serde_json::json!(2));
    }

    #[test]
    fn change_password_request_uses_camel_case() {
        let request: ChangePasswordRequest = serde_json::from_value(serde_json::json!({
            "oldPassword": "old",
            "newPassword": "new",
        }))
        .unwrap();

        assert_eq!(request.old_password, "old");
        assert_eq!(request.new_password, "new");
    }
}
