use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub hostname: String,
    pub port: u16,
    /// Issuer name baked into TOTP provisioning URIs.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Shared secret for the admin gate (X-Admin-Key header).
    pub admin_key: String,
    pub session: SessionConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    /// Fixed session token validity window, independent of license expiry.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

fn default_issuer() -> String {
    "Silica Client".to_string()
}

fn default_ttl_hours() -> i64 {
    24
}

impl AuthConfig {
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SILICA_").split("__"))
            .extract()
    }
}
