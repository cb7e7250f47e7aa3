use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use silica_core::{AuthError, AuthResult};

/// Claims for a session token.
///
/// The validity window is fixed at issue time and independent of the
/// account's license expiry; revocation is enforced by re-reading account
/// state on every validation.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Normalized account email.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Create a session token for an identity with the given validity window.
///
/// Uses HS256 symmetric signing with the provided secret.
pub fn create_session_token(email: &str, secret: &str, ttl_hours: i64) -> AuthResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: email.to_string(),
        iat: now,
        exp: now + ttl_hours * 60 * 60,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| AuthError::Crypto(e.to_string()))
}

/// Validate a session token and return its claims.
///
/// Distinguishes an expired signature (`ExpiredToken`) from every other
/// failure (`InvalidToken`).
pub fn validate_session_token(token: &str, secret: &str) -> AuthResult<SessionClaims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();
    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        }
    })?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-session-tests";
    const OTHER_SECRET: &str = "different-secret-key-for-sessions";
    const EMAIL: &str = "user@example.com";

    #[test]
    fn session_token_roundtrip() {
        let token = create_session_token(EMAIL, SECRET, 24).unwrap();
        let claims = validate_session_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, EMAIL);
    }

    #[test]
    fn wrong_secret_is_invalid_token() {
        let token = create_session_token(EMAIL, SECRET, 24).unwrap();
        let err = validate_session_token(&token, OTHER_SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn garbage_is_invalid_token() {
        let err = validate_session_token("not-a-jwt", SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn ttl_sets_expiry_window() {
        let token = create_session_token(EMAIL, SECRET, 24).unwrap();
        let claims = validate_session_token(&token, SECRET).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_expired_token() {
        // Manually construct a token with exp in the past
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: EMAIL.to_string(),
            iat: now - 7200,
            exp: now - 3600, // expired 1 hour ago
        };
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let err = validate_session_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::ExpiredToken));
    }
}
