use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::login::errors::LoginError;

pub mod portal_login;

/// Client-facing error envelope: `{"error": "<message>"}`.
///
/// The portal front-ends key off this exact shape, so it is not wrapped in
/// any additional response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        (status, Json(ApiErrorBody { error: message })).into_response()
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::UnsupportedPortal(_) => {
                ApiError::BadRequest("Unsupported portal".to_string())
            }
            LoginError::MissingCredentials => ApiError::BadRequest(
                "Please provide Roll/Register Number and DOB (YYYY-MM-DD)".to_string(),
            ),
            LoginError::InvalidStudent => ApiError::Unauthorized(
                "Invalid Roll/Register Number or Date of Birth".to_string(),
            ),
            LoginError::NotActivated => ApiError::Forbidden("Portal Not Activated".to_string()),
            LoginError::Provisioning(_) => {
                ApiError::InternalServerError("Account setup failed".to_string())
            }
            LoginError::InvalidLogin => {
                ApiError::Unauthorized("Invalid login credentials".to_string())
            }
            LoginError::Database(_) => ApiError::InternalServerError("Login failed".to_string()),
            LoginError::Unknown(msg) => ApiError::InternalServerError(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_mapping_uses_client_messages() {
        assert_eq!(
            ApiError::from(LoginError::InvalidStudent),
            ApiError::Unauthorized("Invalid Roll/Register Number or Date of Birth".to_string())
        );
        assert_eq!(
            ApiError::from(LoginError::InvalidLogin),
            ApiError::Unauthorized("Invalid login credentials".to_string())
        );
        assert_eq!(
            ApiError::from(LoginError::NotActivated),
            ApiError::Forbidden("Portal Not Activated".to_string())
        );
        assert_eq!(
            ApiError::from(LoginError::Provisioning("detail".to_string())),
            ApiError::InternalServerError("Account setup failed".to_string())
        );
    }

    #[test]
    fn test_store_detail_never_reaches_the_client() {
        let mapped = ApiError::from(LoginError::Database(
            "relation students does not exist".to_string(),
        ));
        assert_eq!(
            mapped,
            ApiError::InternalServerError("Login failed".to_string())
        );
    }
}
