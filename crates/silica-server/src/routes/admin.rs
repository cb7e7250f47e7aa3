use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::AdminGate;
use crate::error::ApiError;
use crate::state::AppState;
use silica_authority::normalize_identity;
use silica_core::AccountStore;

// ---------------------------------------------------------------------------
// 1. activate
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub email: String,
    pub duration_days: i64,
}

pub async fn activate<S>(
    State(state): State<AppState<S>>,
    _admin: AdminGate,
    Json(body): Json<ActivateRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let email = normalize_identity(&body.email);
    let new_expiry = state.authority.activate(&email, body.duration_days).await?;

    Ok(Json(json!({
        "email": email,
        "expires_at": new_expiry,
    })))
}

// ---------------------------------------------------------------------------
// 2. add-duration / remove-duration
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DurationRequest {
    pub email: String,
    pub days: i64,
}

pub async fn add_duration<S>(
    State(state): State<AppState<S>>,
    _admin: AdminGate,
    Json(body): Json<DurationRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let email = normalize_identity(&body.email);
    let change = state.authority.add_duration(&email, body.days).await?;

    Ok(Json(json!({
        "email": email,
        "new_expiry": change.new_expiry,
        "external_ref": change.external_ref,
    })))
}

pub async fn remove_duration<S>(
    State(state): State<AppState<S>>,
    _admin: AdminGate,
    Json(body): Json<DurationRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let email = normalize_identity(&body.email);
    let change = state.authority.remove_duration(&email, body.days).await?;

    Ok(Json(json!({
        "email": email,
        "new_expiry": change.new_expiry,
        "external_ref": change.external_ref,
    })))
}

// ---------------------------------------------------------------------------
// 3. resets
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct IdentityRequest {
    pub email: String,
}

pub async fn reset_hwid<S>(
    State(state): State<AppState<S>>,
    _admin: AdminGate,
    Json(body): Json<IdentityRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let email = normalize_identity(&body.email);
    state.authority.reset_hardware(&email).await?;

    Ok(Json(json!({ "email": email })))
}

pub async fn reset_account<S>(
    State(state): State<AppState<S>>,
    _admin: AdminGate,
    Json(body): Json<IdentityRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let email = normalize_identity(&body.email);
    let external_ref = state.authority.reset_account(&email).await?;

    Ok(Json(json!({
        "email": email,
        "external_ref": external_ref,
    })))
}

pub async fn reset_all_users<S>(
    State(state): State<AppState<S>>,
    _admin: AdminGate,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let affected = state.authority.reset_all_accounts().await?;

    Ok(Json(json!({ "affected_users": affected })))
}

// ---------------------------------------------------------------------------
// 4. notes & inspection
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SetNoteRequest {
    pub email: String,
    pub note: String,
}

pub async fn set_note<S>(
    State(state): State<AppState<S>>,
    _admin: AdminGate,
    Json(body): Json<SetNoteRequest>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let email = normalize_identity(&body.email);
    state.authority.set_note(&email, &body.note).await?;

    Ok(Json(json!({ "email": email })))
}

#[derive(Debug, Deserialize)]
pub struct UserInfoQuery {
    pub email: String,
}

pub async fn user_info<S>(
    State(state): State<AppState<S>>,
    _admin: AdminGate,
    Query(query): Query<UserInfoQuery>,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let view = state.authority.user_info(&query.email).await?;

    Ok(Json(json!({ "user": view })))
}

pub async fn list_users<S>(
    State(state): State<AppState<S>>,
    _admin: AdminGate,
) -> Result<Json<Value>, ApiError>
where
    S: AccountStore,
{
    let users = state.authority.list_accounts().await?;

    Ok(Json(json!({ "users": users })))
}
