use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::{Row, SqlitePool};

use silica_core::{Account, AccountStore, AuthError, AuthResult, CreateAccountInput};

#[derive(Clone)]
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

/// Parse a SQLite datetime text string into a chrono DateTime<Utc>.
///
/// SQLite stores datetimes as TEXT in the format produced by
/// `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`, which yields strings like
/// `2025-01-01T00:00:00.000Z`.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AuthError> {
    // Try RFC 3339 first (handles the trailing Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Fallback: parse as NaiveDateTime with milliseconds
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    // Fallback: parse without fractional seconds
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(AuthError::Storage(format!("failed to parse datetime: {s}")))
}

/// Parse an optional SQLite datetime text string.
fn parse_datetime_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>, AuthError> {
    match s {
        Some(s) => Ok(Some(parse_datetime(s)?)),
        None => Ok(None),
    }
}

/// Format a chrono DateTime for TEXT storage.
fn fmt_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Map a sqlx Row to an Account.
fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account, AuthError> {
    let email: String = row
        .try_get("email")
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let password_hash: String = row
        .try_get("password_hash")
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let totp_secret: String = row
        .try_get("totp_secret")
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let hwid: Option<String> = row
        .try_get("hwid")
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let active: i32 = row
        .try_get("active")
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let expires_at: Option<String> = row
        .try_get("expires_at")
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let last_login: Option<String> = row
        .try_get("last_login")
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let external_ref: Option<String> = row
        .try_get("external_ref")
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let note: Option<String> = row
        .try_get("note")
        .map_err(|e| AuthError::Storage(e.to_string()))?;

    Ok(Account {
        email,
        password_hash,
        totp_secret,
        hwid,
        active: active != 0,
        created_at: parse_datetime(&created_at)?,
        expires_at: parse_datetime_opt(expires_at.as_deref())?,
        last_login: parse_datetime_opt(last_login.as_deref())?,
        external_ref,
        note,
    })
}

/// SQL fragment for the account SELECT.
const ACCOUNT_SELECT: &str = r#"
    SELECT
        email,
        password_hash,
        totp_secret,
        hwid,
        active,
        created_at,
        expires_at,
        last_login,
        external_ref,
        note
    FROM account
"#;

impl SqliteAccountStore {
    pub async fn connect(url: &str) -> AuthResult<Self> {
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Helper: fetch an Account with a WHERE clause appended to the base SELECT.
    async fn get_account_where(
        &self,
        where_clause: &str,
        bind_value: &str,
    ) -> AuthResult<Option<Account>> {
        let sql = format!("{ACCOUNT_SELECT} WHERE {where_clause}");
        let row = sqlx::query(&sql)
            .bind(bind_value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        match row {
            Some(ref r) => Ok(Some(row_to_account(r)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn create_account(&self, input: &CreateAccountInput) -> AuthResult<Account> {
        sqlx::query(
            "INSERT INTO account (email, password_hash, totp_secret, external_ref, note, active, expires_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.totp_secret)
        .bind(&input.external_ref)
        .bind(&input.note)
        .bind(input.active as i32)
        .bind(input.expires_at.map(fmt_datetime))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|d| d.is_unique_violation())
            {
                AuthError::DuplicateIdentity
            } else {
                AuthError::Storage(e.to_string())
            }
        })?;

        // Query back the full Account (picks up the created_at default)
        self.get_account(&input.email).await?.ok_or_else(|| {
            AuthError::Storage("failed to retrieve account after creation".to_string())
        })
    }

    async fn get_account(&self, email: &str) -> AuthResult<Option<Account>> {
        self.get_account_where("email = ?", email).await
    }

    async fn get_account_by_external_ref(
        &self,
        external_ref: &str,
    ) -> AuthResult<Option<Account>> {
        self.get_account_where("external_ref = ?", external_ref)
            .await
    }

    async fn set_active(&self, email: &str, expires_at: DateTime<Utc>) -> AuthResult<bool> {
        let result = sqlx::query("UPDATE account SET active = 1, expires_at = ? WHERE email = ?")
            .bind(fmt_datetime(expires_at))
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_expiry(&self, email: &str, expires_at: DateTime<Utc>) -> AuthResult<bool> {
        let result = sqlx::query("UPDATE account SET expires_at = ? WHERE email = ?")
            .bind(fmt_datetime(expires_at))
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn bind_hardware(
        &self,
        email: &str,
        hwid: &str,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        // The `hwid IS NULL` guard makes the first bind a single atomic
        // conditional write; a racing second bind affects zero rows.
        let result = sqlx::query(
            "UPDATE account SET hwid = ?, last_login = ? WHERE email = ? AND hwid IS NULL",
        )
        .bind(hwid)
        .bind(fmt_datetime(at))
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_login(&self, email: &str, at: DateTime<Utc>) -> AuthResult<bool> {
        let result = sqlx::query("UPDATE account SET last_login = ? WHERE email = ?")
            .bind(fmt_datetime(at))
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_hardware(&self, email: &str) -> AuthResult<bool> {
        let result = sqlx::query("UPDATE account SET hwid = NULL WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_account(&self, email: &str) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM account WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn reset_all(&self) -> AuthResult<u64> {
        let result = sqlx::query(
            "UPDATE account SET hwid = NULL, active = 0, expires_at = NULL, last_login = NULL",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn set_note(&self, email: &str, note: &str) -> AuthResult<bool> {
        let result = sqlx::query("UPDATE account SET note = ? WHERE email = ?")
            .bind(note)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_accounts(&self) -> AuthResult<Vec<Account>> {
        let sql = format!("{ACCOUNT_SELECT} ORDER BY created_at DESC, email ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        rows.iter().map(row_to_account).collect()
    }
}
