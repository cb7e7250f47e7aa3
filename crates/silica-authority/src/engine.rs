//! Login adjudication and session validation.
//!
//! Login proceeds through an ordered gate; the first failing check
//! determines the error and no later check runs, so a caller cannot learn
//! which later factor would have failed.

use chrono::{DateTime, Utc};
use silica_core::{Account, AccountStore, AuthError, AuthResult};

use crate::{LicenseAuthority, normalize_identity};

impl<S: AccountStore> LicenseAuthority<S> {
    /// Adjudicate a login attempt and issue a session token.
    ///
    /// Gate order: identity → activation → license expiry → password →
    /// one-time code → hardware binding. On an unbound account a non-empty
    /// presented hardware id is bound permanently; an absent or empty id
    /// leaves the account unbound.
    pub async fn login(
        &self,
        identity: &str,
        secret: &str,
        otp_code: &str,
        hwid: Option<&str>,
    ) -> AuthResult<String> {
        let email = normalize_identity(identity);
        let account = self
            .store()
            .get_account(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.active {
            return Err(AuthError::NotActivated);
        }

        let now = Utc::now();
        if let Some(expires_at) = account.expires_at {
            if expires_at <= now {
                return Err(AuthError::Expired);
            }
        }

        if !silica_crypto::verify_password(secret, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if !silica_crypto::verify_code(&account.totp_secret, otp_code, &self.issuer, &email)? {
            return Err(AuthError::InvalidSecondFactor);
        }

        self.adjudicate_binding(&account, hwid, now).await?;

        silica_crypto::create_session_token(
            &email,
            &self.session_secret,
            self.session_ttl_hours,
        )
    }

    /// Hardware binding check plus the atomic login-timestamp write.
    ///
    /// The first bind is a conditional single-row update; when two first
    /// logins race, exactly one wins and the loser is re-adjudicated
    /// against the winner's binding.
    async fn adjudicate_binding(
        &self,
        account: &Account,
        hwid: Option<&str>,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let presented = hwid.map(str::trim).filter(|h| !h.is_empty());

        match (account.hwid.as_deref(), presented) {
            (None, Some(h)) => {
                if self.store().bind_hardware(&account.email, h, now).await? {
                    return Ok(());
                }
                // Lost the bind race; read back the winning binding.
                let current = self
                    .store()
                    .get_account(&account.email)
                    .await?
                    .ok_or(AuthError::InvalidCredentials)?;
                match current.hwid.as_deref() {
                    Some(bound) if bound == h => self.touch_login(&account.email, now).await,
                    _ => Err(AuthError::HardwareMismatch),
                }
            }
            // No hardware id presented and none bound: succeed without
            // binding rather than locking the account to an empty value.
            (None, None) => self.touch_login(&account.email, now).await,
            (Some(bound), Some(h)) if bound == h => self.touch_login(&account.email, now).await,
            (Some(_), _) => Err(AuthError::HardwareMismatch),
        }
    }

    async fn touch_login(&self, email: &str, now: DateTime<Utc>) -> AuthResult<()> {
        if !self.store().record_login(email, now).await? {
            // Deleted out from under us; report as the identity gate would.
            return Err(AuthError::InvalidCredentials);
        }
        Ok(())
    }

    /// Validate an issued session token against current account state.
    ///
    /// Pure read side: verifies signature and token expiry, then requires
    /// the account to still exist, be active, be unexpired, and carry an
    /// exactly matching hardware binding. An unbound account passes only
    /// an absent/empty presented id, mirroring the login-side no-bind
    /// rule; a session from a hardware-less login stays usable without
    /// ever binding. Never binds and never mutates.
    pub async fn validate_session(&self, token: &str, hwid: &str) -> AuthResult<String> {
        let claims = silica_crypto::validate_session_token(token, &self.session_secret)?;

        let account = self
            .store()
            .get_account(&claims.sub)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !account.active {
            return Err(AuthError::NotActivated);
        }
        if let Some(expires_at) = account.expires_at {
            if expires_at <= Utc::now() {
                return Err(AuthError::Expired);
            }
        }
        match (account.hwid.as_deref(), hwid.trim()) {
            (None, "") => {}
            (Some(bound), presented) if bound == presented => {}
            _ => return Err(AuthError::HardwareMismatch),
        }

        Ok(account.email)
    }
}
