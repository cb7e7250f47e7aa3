pub mod otp;
pub mod password;
pub mod token;

pub use otp::{current_code, generate_seed, verify_code};
pub use password::{generate_password, hash_password, verify_password};
pub use token::{SessionClaims, create_session_token, validate_session_token};
