use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::AdminStatus;
use crate::error::ApiError;
use crate::state::AppState;
use silica_core::{AccountStore, AuthError};

// ---------------------------------------------------------------------------
// 1. register
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub external_ref: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// Admin/payment path: create the account already active.
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub duration_days: Option<i64>,
}

pub async fn register<S>(
    State(state): State<AppState<S>>,
    AdminStatus(is_admin): AdminStatus,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let activate_for_days = if body.active.unwrap_or(false) {
        if !is_admin {
            return Err(AuthError::Unauthorized.into());
        }
        let days = body.duration_days.ok_or_else(|| {
            AuthError::InvalidArgument("duration_days is required with active".to_string())
        })?;
        Some(days)
    } else {
        None
    };

    let registration = state
        .authority
        .register(&body.email, body.external_ref, body.note, activate_for_days)
        .await?;

    // The plaintext password, seed, and provisioning URI are returned
    // exactly once; delivery (QR render, DM) is the caller's problem.
    Ok(Json(json!({
        "email": registration.email,
        "password": registration.password,
        "totp_secret": registration.totp_secret,
        "otp_uri": registration.otp_uri,
    })))
}

// ---------------------------------------------------------------------------
// 2. login
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub totp: String,
    #[serde(default)]
    pub hwid: Option<String>,
}

pub async fn login<S>(
    State(state): State<AppState<S>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let token = state
        .authority
        .login(&body.email, &body.password, &body.totp, body.hwid.as_deref())
        .await?;

    Ok(Json(json!({ "token": token })))
}

// ---------------------------------------------------------------------------
// 3. validate
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub token: String,
    pub hwid: String,
}

pub async fn validate<S>(
    State(state): State<AppState<S>>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let email = state
        .authority
        .validate_session(&body.token, &body.hwid)
        .await?;

    Ok(Json(json!({ "email": email })))
}

// ---------------------------------------------------------------------------
// 4. check-external
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CheckExternalQuery {
    pub external_ref: String,
}

pub async fn check_external<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<CheckExternalQuery>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let exists = state
        .authority
        .check_external_ref(&query.external_ref)
        .await?;

    Ok(Json(json!({ "exists": exists })))
}
