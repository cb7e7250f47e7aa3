//! The license & binding authority: the credential lifecycle and hardware
//! binding state machine, generic over the durable [`AccountStore`].
//!
//! All callers (HTTP handlers, payment hooks, chat-bot notifiers) invoke
//! the authority through this crate; none of them hold authoritative
//! state. Admin authorization is adjudicated by the caller — the
//! authority never sees the admin key.

pub mod admin;
pub mod engine;

use std::sync::Arc;

use silica_core::{AccountStore, AuthError, AuthResult, CreateAccountInput};

/// Authority construction parameters, extracted from the application
/// config by the caller.
#[derive(Debug, Clone)]
pub struct AuthorityOptions {
    /// Issuer name for TOTP provisioning URIs.
    pub issuer: String,
    /// HS256 signing secret for session tokens.
    pub session_secret: String,
    /// Fixed session token validity window.
    pub session_ttl_hours: i64,
}

pub struct LicenseAuthority<S: AccountStore> {
    store: Arc<S>,
    issuer: String,
    session_secret: String,
    session_ttl_hours: i64,
}

/// Everything a new registration hands back to the caller for out-of-band
/// delivery. The plaintext password and the TOTP seed exist nowhere else
/// after this value is dropped.
#[derive(Debug)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub totp_secret: String,
    pub otp_uri: String,
}

impl<S: AccountStore> LicenseAuthority<S> {
    pub fn new(store: Arc<S>, options: AuthorityOptions) -> Self {
        Self {
            store,
            issuer: options.issuer,
            session_secret: options.session_secret,
            session_ttl_hours: options.session_ttl_hours,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register a new account under the normalized identity.
    ///
    /// `activate_for_days` is the admin/payment creation path: the account
    /// is created already active with the given license duration. Callers
    /// must gate it; plain registrations leave it `None` and the account
    /// pending.
    pub async fn register(
        &self,
        identity: &str,
        external_ref: Option<String>,
        note: Option<String>,
        activate_for_days: Option<i64>,
    ) -> AuthResult<Registration> {
        let email = normalize_identity(identity);
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidArgument(
                "a valid email address is required".to_string(),
            ));
        }
        if let Some(days) = activate_for_days {
            if days <= 0 {
                return Err(AuthError::InvalidArgument(
                    "duration must be positive".to_string(),
                ));
            }
        }
        if self.store.get_account(&email).await?.is_some() {
            return Err(AuthError::DuplicateIdentity);
        }

        let password = silica_crypto::generate_password();
        let password_hash = silica_crypto::hash_password(&password)?;
        let (totp_secret, otp_uri) = silica_crypto::generate_seed(&self.issuer, &email)?;

        let expires_at = activate_for_days.map(|days| chrono::Utc::now() + chrono::Duration::days(days));
        let input = CreateAccountInput {
            email: email.clone(),
            password_hash,
            totp_secret: totp_secret.clone(),
            external_ref,
            note,
            active: activate_for_days.is_some(),
            expires_at,
        };
        // The store maps a unique violation to DuplicateIdentity, so a
        // racing duplicate registration still fails cleanly.
        self.store.create_account(&input).await?;

        tracing::info!(%email, "registered new account");
        Ok(Registration {
            email,
            password,
            totp_secret,
            otp_uri,
        })
    }

    /// Whether an account already exists for an external (chat-platform)
    /// identity; used by notifier bots for deduplication.
    pub async fn check_external_ref(&self, external_ref: &str) -> AuthResult<bool> {
        Ok(self
            .store
            .get_account_by_external_ref(external_ref)
            .await?
            .is_some())
    }
}

/// Lowercase and trim an identity before any comparison or storage.
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::normalize_identity;

    #[test]
    fn normalization_lowercases_and_trims() {
        assert_eq!(normalize_identity("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_identity("bob@test.com"), "bob@test.com");
    }
}
