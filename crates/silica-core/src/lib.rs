pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use traits::AccountStore;
pub use types::{Account, AccountView, CreateAccountInput};
