pub mod assertions;
pub mod server;
pub mod stores;

pub use assertions::{assert_api_error, assert_api_ok};
pub use server::{
    TEST_ADMIN_KEY, TEST_ISSUER, TEST_SESSION_SECRET, create_test_app_state, create_test_router,
    create_test_router_and_store, current_otp, register_via_api, send_request,
};
pub use stores::{TestStore, create_test_store};

#[cfg(test)]
mod tests {
    use super::*;
    use silica_core::AccountStore;

    #[tokio::test]
    async fn test_store_is_usable() {
        let store = create_test_store().await;

        // Verify we can query an empty account store
        let result = store.account_store.list_accounts().await.unwrap();
        assert!(result.is_empty());
    }
}
