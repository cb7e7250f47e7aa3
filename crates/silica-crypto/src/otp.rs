use silica_core::{AuthError, AuthResult};
use totp_rs::{Algorithm, Secret, TOTP};

// RFC 6238 defaults; skew of 1 accepts the adjacent time steps on either
// side to tolerate client clock drift.
const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECONDS: u64 = 30;

fn build_totp(secret_base32: &str, issuer: &str, account: &str) -> AuthResult<TOTP> {
    let secret_bytes = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|e| AuthError::Crypto(format!("invalid TOTP seed: {e:?}")))?;
    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECONDS,
        secret_bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| AuthError::Crypto(format!("TOTP init: {e}")))
}

/// Generate a fresh TOTP seed for an account.
///
/// Returns `(base32_seed, otpauth_uri)`. The URI is handed to an external
/// collaborator for QR rendering; the seed itself is persisted.
pub fn generate_seed(issuer: &str, account: &str) -> AuthResult<(String, String)> {
    let secret = Secret::generate_secret();
    let base32 = secret.to_encoded().to_string();
    let totp = build_totp(&base32, issuer, account)?;
    Ok((base32, totp.get_url()))
}

/// Verify a one-time code against a base32 seed, within the skew window.
pub fn verify_code(secret_base32: &str, code: &str, issuer: &str, account: &str)
-> AuthResult<bool> {
    let totp = build_totp(secret_base32, issuer, account)?;
    totp.check_current(code)
        .map_err(|e| AuthError::Crypto(format!("TOTP check: {e}")))
}

/// Compute the current code for a seed. Test helper; login flows only ever
/// verify codes presented by clients.
pub fn current_code(secret_base32: &str, issuer: &str, account: &str) -> AuthResult<String> {
    let totp = build_totp(secret_base32, issuer, account)?;
    totp.generate_current()
        .map_err(|e| AuthError::Crypto(format!("TOTP generate: {e}")))
}
