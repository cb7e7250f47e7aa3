use axum::Extension;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;

use crate::error::ApiError;

/// A newtype wrapper around the shared admin secret, added as an Axum
/// Extension so the extractors below never need the full config.
#[derive(Clone)]
pub struct AdminKey(pub String);

/// Proof that the request carried the correct `X-Admin-Key` header.
///
/// The admin-key comparison happens entirely in this extractor; handlers
/// and the authority only ever see the capability, never the header. Any
/// absence or mismatch yields one uniform failure with no further detail.
#[derive(Debug, Clone)]
pub struct AdminGate;

/// Optional admin check for endpoints with both public and admin arms.
/// Carries `true` only when the correct key was presented.
#[derive(Debug, Clone, Copy)]
pub struct AdminStatus(pub bool);

fn uniform_denial() -> ApiError {
    ApiError::new(StatusCode::FORBIDDEN, "AdminRequired", "Admin access required")
}

fn presented_key(parts: &Parts) -> Option<&str> {
    parts.headers.get("x-admin-key").and_then(|v| v.to_str().ok())
}

impl<S> FromRequestParts<S> for AdminGate
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(admin_key) = Extension::<AdminKey>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "admin key not configured",
                )
            })?;

        match presented_key(parts) {
            Some(key) if key == admin_key.0 => Ok(AdminGate),
            _ => {
                // Log the path only; the presented key never hits the logs.
                tracing::warn!(path = %parts.uri.path(), "admin gate denied");
                Err(uniform_denial())
            }
        }
    }
}

impl<S> FromRequestParts<S> for AdminStatus
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // No header at all is the common public-caller case.
        if presented_key(parts).is_none() {
            return Ok(AdminStatus(false));
        }
        match AdminGate::from_request_parts(parts, state).await {
            Ok(AdminGate) => Ok(AdminStatus(true)),
            Err(_) => Ok(AdminStatus(false)),
        }
    }
}
