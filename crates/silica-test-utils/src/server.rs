use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use silica_authority::{AuthorityOptions, LicenseAuthority};
use silica_core::config::{AuthConfig, DatabaseConfig, SessionConfig};
use silica_server::{AppState, build_router};
use silica_storage_sqlite::SqliteAccountStore;

use crate::stores::{TestStore, create_test_store};

pub const TEST_ADMIN_KEY: &str = "test-admin-key-not-for-production";
pub const TEST_SESSION_SECRET: &str = "test-session-secret-at-least-32-chars";
pub const TEST_ISSUER: &str = "Silica Client";

pub fn create_test_config() -> AuthConfig {
    AuthConfig {
        hostname: "127.0.0.1".to_string(),
        port: 0,
        issuer: TEST_ISSUER.to_string(),
        admin_key: TEST_ADMIN_KEY.to_string(),
        session: SessionConfig {
            secret: TEST_SESSION_SECRET.to_string(),
            ttl_hours: 24,
        },
        database: DatabaseConfig {
            url: String::new(), // not used; the store is pre-connected
        },
    }
}

pub fn create_test_app_state(store: &TestStore) -> AppState<SqliteAccountStore> {
    let config = create_test_config();
    let authority = LicenseAuthority::new(
        Arc::new(store.account_store.clone()),
        AuthorityOptions {
            issuer: config.issuer.clone(),
            session_secret: config.session.secret.clone(),
            session_ttl_hours: config.session.ttl_hours,
        },
    );

    AppState {
        authority: Arc::new(authority),
        config: Arc::new(config),
    }
}

pub fn create_test_router(store: &TestStore) -> Router {
    build_router(create_test_app_state(store))
}

pub async fn create_test_router_and_store() -> (Router, TestStore) {
    let store = create_test_store().await;
    let router = create_test_router(&store);
    (router, store)
}

/// Register an account via the API and return (email, password, totp_secret).
pub async fn register_via_api(router: &Router, email: &str) -> (String, String, String) {
    let body = serde_json::json!({ "email": email });
    let (status, json) = send_request(router, "POST", "/auth/register", None, Some(body)).await;
    assert_eq!(status, 200, "register failed: {json}");

    let email = json["email"].as_str().unwrap().to_string();
    let password = json["password"].as_str().unwrap().to_string();
    let totp_secret = json["totp_secret"].as_str().unwrap().to_string();

    (email, password, totp_secret)
}

/// Compute the account's current one-time code from its seed.
pub fn current_otp(totp_secret: &str, email: &str) -> String {
    silica_crypto::current_code(totp_secret, TEST_ISSUER, email).expect("TOTP code")
}

/// Send a request through the router and return (status, body_json).
///
/// `admin_key`, when set, is sent as the X-Admin-Key header.
pub async fn send_request(
    router: &Router,
    method: &str,
    uri: &str,
    admin_key: Option<&str>,
    body: Option<Value>,
) -> (u16, Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);

    if let Some(key) = admin_key {
        builder = builder.header("x-admin-key", key);
    }

    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }

    let req_body = match body {
        Some(b) => Body::from(serde_json::to_vec(&b).unwrap()),
        None => Body::empty(),
    };

    let req = builder.body(req_body).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status().as_u16();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or(Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json)
}
