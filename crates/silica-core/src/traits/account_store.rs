use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AuthResult;
use crate::types::{Account, CreateAccountInput};

/// Durable store of license accounts, keyed by normalized email.
///
/// Boolean returns report whether a matching record existed; callers map
/// `false` to [`crate::AuthError::NotFound`]. All single-record mutations
/// must be atomic.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Fails with `DuplicateIdentity` if the email is already registered.
    async fn create_account(&self, input: &CreateAccountInput) -> AuthResult<Account>;
    async fn get_account(&self, email: &str) -> AuthResult<Option<Account>>;
    async fn get_account_by_external_ref(&self, external_ref: &str)
    -> AuthResult<Option<Account>>;

    /// Sets the account active with the given expiry, overwriting any prior
    /// expiry.
    async fn set_active(&self, email: &str, expires_at: DateTime<Utc>) -> AuthResult<bool>;
    /// Replaces the expiry without touching the activation flag.
    async fn update_expiry(&self, email: &str, expires_at: DateTime<Utc>) -> AuthResult<bool>;

    /// Conditionally binds hardware: a single `hwid IS NULL` guarded write
    /// that also records the login timestamp. Returns `false` when the
    /// account is missing or already bound — exactly one concurrent
    /// first-login can win.
    async fn bind_hardware(&self, email: &str, hwid: &str, at: DateTime<Utc>)
    -> AuthResult<bool>;
    /// Records a successful login on an already-adjudicated account.
    async fn record_login(&self, email: &str, at: DateTime<Utc>) -> AuthResult<bool>;

    async fn clear_hardware(&self, email: &str) -> AuthResult<bool>;
    async fn delete_account(&self, email: &str) -> AuthResult<bool>;
    /// Returns every account to unbound, pending, non-expiring state.
    /// Returns the number of records affected.
    async fn reset_all(&self) -> AuthResult<u64>;

    async fn set_note(&self, email: &str, note: &str) -> AuthResult<bool>;
    async fn list_accounts(&self) -> AuthResult<Vec<Account>>;
}
