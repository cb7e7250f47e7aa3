use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use silica_core::AuthError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_name: String,
    pub message: String,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        error_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            error_name: error_name.into(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error_name,
            "message": self.message,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::DuplicateIdentity => ApiError::new(
                StatusCode::BAD_REQUEST,
                "DuplicateIdentity",
                err.to_string(),
            ),
            AuthError::NotFound => {
                ApiError::new(StatusCode::NOT_FOUND, "NotFound", err.to_string())
            }
            AuthError::InvalidArgument(_) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "InvalidArgument",
                err.to_string(),
            ),
            AuthError::InvalidCredentials => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "InvalidCredentials",
                err.to_string(),
            ),
            AuthError::NotActivated => {
                ApiError::new(StatusCode::FORBIDDEN, "NotActivated", err.to_string())
            }
            AuthError::Expired => {
                ApiError::new(StatusCode::FORBIDDEN, "Expired", err.to_string())
            }
            AuthError::InvalidSecondFactor => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "InvalidSecondFactor",
                err.to_string(),
            ),
            AuthError::HardwareMismatch => ApiError::new(
                StatusCode::FORBIDDEN,
                "HardwareMismatch",
                err.to_string(),
            ),
            AuthError::InvalidToken => {
                ApiError::new(StatusCode::UNAUTHORIZED, "InvalidToken", err.to_string())
            }
            AuthError::ExpiredToken => {
                ApiError::new(StatusCode::UNAUTHORIZED, "ExpiredToken", err.to_string())
            }
            AuthError::Unauthorized => ApiError::new(
                StatusCode::FORBIDDEN,
                "AdminRequired",
                "Admin access required",
            ),
            AuthError::Storage(_) | AuthError::Crypto(_) | AuthError::Internal(_) => {
                tracing::error!(%err, "internal error surfaced to client");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    err.to_string(),
                )
            }
        }
    }
}
