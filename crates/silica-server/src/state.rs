use std::sync::Arc;

use silica_authority::LicenseAuthority;
use silica_core::{AccountStore, AuthConfig};

pub struct AppState<S>
where
    S: AccountStore,
{
    pub authority: Arc<LicenseAuthority<S>>,
    pub config: Arc<AuthConfig>,
}

impl<S: AccountStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            authority: Arc::clone(&self.authority),
            config: Arc::clone(&self.config),
        }
    }
}
