use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity already registered")]
    DuplicateIdentity,

    #[error("account not found")]
    NotFound,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Covers both unknown identity and wrong secret; callers must not be
    // able to tell which factor failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account not activated")]
    NotActivated,

    #[error("account has expired")]
    Expired,

    #[error("invalid 2FA code")]
    InvalidSecondFactor,

    #[error("hardware id mismatch")]
    HardwareMismatch,

    #[error("invalid token")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("admin access required")]
    Unauthorized,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
