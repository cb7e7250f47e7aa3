use tempfile::TempDir;

use silica_storage_sqlite::SqliteAccountStore;

pub struct TestStore {
    pub account_store: SqliteAccountStore,
    /// Hold the TempDir to keep it alive for the test's duration.
    pub _tempdir: TempDir,
}

/// Create a fresh file-backed SQLite account store in a tempdir.
pub async fn create_test_store() -> TestStore {
    let tempdir = TempDir::new().expect("failed to create tempdir");
    let db_path = tempdir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let account_store = SqliteAccountStore::connect(&db_url)
        .await
        .expect("failed to connect account store");

    TestStore {
        account_store,
        _tempdir: tempdir,
    }
}
