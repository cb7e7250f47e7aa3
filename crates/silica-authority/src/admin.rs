//! Admin-gated account management: activation, duration arithmetic,
//! resets, notes, and inspection views.
//!
//! Callers are responsible for the admin capability check; every
//! operation here assumes it already passed.

use chrono::{DateTime, Duration, Utc};
use silica_core::{AccountStore, AccountView, AuthError, AuthResult};

use crate::{LicenseAuthority, normalize_identity};

/// Outcome of a duration adjustment. Carries the external reference so a
/// notifier collaborator can reach the account's owner.
#[derive(Debug)]
pub struct ExpiryChange {
    pub new_expiry: DateTime<Utc>,
    pub external_ref: Option<String>,
}

impl<S: AccountStore> LicenseAuthority<S> {
    /// Activate an account for `duration_days`, overwriting any prior
    /// expiry rather than accumulating.
    pub async fn activate(&self, identity: &str, duration_days: i64) -> AuthResult<DateTime<Utc>> {
        let email = normalize_identity(identity);
        let expires_at = Utc::now() + Duration::days(positive_days(duration_days)?);
        if !self.store().set_active(&email, expires_at).await? {
            return Err(AuthError::NotFound);
        }
        tracing::info!(%email, %expires_at, "activated account");
        Ok(expires_at)
    }

    /// Extend the license: from the existing expiry if one is set, else
    /// from now. Does not change the activation state.
    pub async fn add_duration(&self, identity: &str, days: i64) -> AuthResult<ExpiryChange> {
        let email = normalize_identity(identity);
        let days = positive_days(days)?;
        let account = self
            .store()
            .get_account(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let new_expiry = account.expires_at.unwrap_or_else(Utc::now) + Duration::days(days);
        if !self.store().update_expiry(&email, new_expiry).await? {
            return Err(AuthError::NotFound);
        }
        Ok(ExpiryChange {
            new_expiry,
            external_ref: account.external_ref,
        })
    }

    /// Shorten the license, clamping at now so an expiry is never moved
    /// into the past. Fails if the account has no expiry to shorten.
    pub async fn remove_duration(&self, identity: &str, days: i64) -> AuthResult<ExpiryChange> {
        let email = normalize_identity(identity);
        let days = positive_days(days)?;
        let account = self
            .store()
            .get_account(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let expires_at = account.expires_at.ok_or_else(|| {
            AuthError::InvalidArgument("account has no expiry date set".to_string())
        })?;

        let now = Utc::now();
        let mut new_expiry = expires_at - Duration::days(days);
        if new_expiry < now {
            new_expiry = now;
        }
        if !self.store().update_expiry(&email, new_expiry).await? {
            return Err(AuthError::NotFound);
        }
        Ok(ExpiryChange {
            new_expiry,
            external_ref: account.external_ref,
        })
    }

    /// Clear the hardware binding so the next login rebinds.
    pub async fn reset_hardware(&self, identity: &str) -> AuthResult<()> {
        let email = normalize_identity(identity);
        if !self.store().clear_hardware(&email).await? {
            return Err(AuthError::NotFound);
        }
        tracing::warn!(%email, "hardware binding reset");
        Ok(())
    }

    /// Delete the account record entirely. Returns the external reference
    /// for caller-side notification.
    pub async fn reset_account(&self, identity: &str) -> AuthResult<Option<String>> {
        let email = normalize_identity(identity);
        let account = self
            .store()
            .get_account(&email)
            .await?
            .ok_or(AuthError::NotFound)?;
        if !self.store().delete_account(&email).await? {
            return Err(AuthError::NotFound);
        }
        tracing::warn!(%email, "account deleted by admin reset");
        Ok(account.external_ref)
    }

    /// Return every account to unbound, pending, non-expiring state
    /// without deleting records. Returns the count affected.
    pub async fn reset_all_accounts(&self) -> AuthResult<u64> {
        let affected = self.store().reset_all().await?;
        tracing::warn!(affected, "bulk account reset");
        Ok(affected)
    }

    /// Free-text admin annotation; no effect on authentication.
    pub async fn set_note(&self, identity: &str, note: &str) -> AuthResult<()> {
        let email = normalize_identity(identity);
        if !self.store().set_note(&email, note).await? {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    pub async fn user_info(&self, identity: &str) -> AuthResult<AccountView> {
        let email = normalize_identity(identity);
        self.store()
            .get_account(&email)
            .await?
            .map(AccountView::from)
            .ok_or(AuthError::NotFound)
    }

    pub async fn list_accounts(&self) -> AuthResult<Vec<AccountView>> {
        let accounts = self.store().list_accounts().await?;
        Ok(accounts.into_iter().map(AccountView::from).collect())
    }
}

fn positive_days(days: i64) -> AuthResult<i64> {
    if days <= 0 {
        return Err(AuthError::InvalidArgument(
            "duration must be positive".to_string(),
        ));
    }
    Ok(days)
}
