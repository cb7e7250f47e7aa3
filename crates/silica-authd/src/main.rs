use std::sync::Arc;

use silica_authority::{AuthorityOptions, LicenseAuthority};
use silica_core::AuthConfig;
use silica_server::{AppState, build_router};
use silica_storage_sqlite::SqliteAccountStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().pretty().init();

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/authd.toml".to_string());
    let config = AuthConfig::load(&config_path)?;

    // Ensure the data directory exists
    std::fs::create_dir_all("data")?;

    let account_store = SqliteAccountStore::connect(&config.database.url).await?;

    let authority = LicenseAuthority::new(
        Arc::new(account_store),
        AuthorityOptions {
            issuer: config.issuer.clone(),
            session_secret: config.session.secret.clone(),
            session_ttl_hours: config.session.ttl_hours,
        },
    );

    let addr = format!("{}:{}", config.hostname, config.port);

    let state = AppState {
        authority: Arc::new(authority),
        config: Arc::new(config),
    };

    let router = build_router(state);

    tracing::info!("silica-authd starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
