pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{AdminGate, AdminKey, AdminStatus};
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
