use serde::{Deserialize, Serialize};

/// A license account as stored. Carries the secret material; never leaves
/// the authority except through [`AccountView`].
#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    pub password_hash: String,
    pub totp_secret: String,
    pub hwid: Option<String>,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub external_ref: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub email: String,
    pub password_hash: String,
    pub totp_secret: String,
    pub external_ref: Option<String>,
    pub note: Option<String>,
    pub active: bool,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Read-side projection of an account for admin inspection. Deliberately
/// omits `password_hash` and `totp_secret`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountView {
    pub email: String,
    pub hwid: Option<String>,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub external_ref: Option<String>,
    pub note: Option<String>,
}

impl From<Account> for AccountView {
    fn from(a: Account) -> Self {
        AccountView {
            email: a.email,
            hwid: a.hwid,
            active: a.active,
            created_at: a.created_at,
            expires_at: a.expires_at,
            last_login: a.last_login,
            external_ref: a.external_ref,
            note: a.note,
        }
    }
}
