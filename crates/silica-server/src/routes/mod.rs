pub mod admin;
pub mod auth;
pub mod health;

use axum::Extension;

use crate::auth::AdminKey;
use crate::state::AppState;
use silica_core::AccountStore;

pub fn build_router<S>(state: AppState<S>) -> axum::Router
where
    S: AccountStore,
{
    let admin_key = AdminKey(state.config.admin_key.clone());

    axum::Router::new()
        // Liveness
        .route("/", axum::routing::get(health::root))
        .route("/health", axum::routing::get(health::health_check))
        // Public auth endpoints
        .route("/auth/register", axum::routing::post(auth::register::<S>))
        .route("/auth/login", axum::routing::post(auth::login::<S>))
        .route("/auth/validate", axum::routing::post(auth::validate::<S>))
        .route(
            "/auth/check-external",
            axum::routing::get(auth::check_external::<S>),
        )
        // Admin-gated account management
        .route("/auth/activate", axum::routing::post(admin::activate::<S>))
        .route(
            "/auth/add-duration",
            axum::routing::post(admin::add_duration::<S>),
        )
        .route(
            "/auth/remove-duration",
            axum::routing::post(admin::remove_duration::<S>),
        )
        .route(
            "/auth/reset-hwid",
            axum::routing::post(admin::reset_hwid::<S>),
        )
        .route(
            "/auth/reset-account",
            axum::routing::post(admin::reset_account::<S>),
        )
        .route(
            "/auth/reset-all-users",
            axum::routing::post(admin::reset_all_users::<S>),
        )
        .route("/auth/set-note", axum::routing::post(admin::set_note::<S>))
        .route("/auth/user-info", axum::routing::get(admin::user_info::<S>))
        .route("/auth/users", axum::routing::get(admin::list_users::<S>))
        .layer(Extension(admin_key))
        // CORS: callers are the checkout site and the notifier bot.
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Request body size limit: auth payloads are tiny.
        .layer(tower_http::limit::RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state)
}
