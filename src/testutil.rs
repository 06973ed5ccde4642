//! Shared test helpers for gallery-manager integration tests.

use std::sync::Arc;

use crate::config::Config;
use crate::object_store::LocalStore;
use crate::service::Gallery;
use crate::storage::Store;
use crate::AppState;

/// Create a test AppState with a temporary document store and upload store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let upload_dir = temp_dir.path().join("uploads");

    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        data_dir: data_dir.to_string_lossy().to_string(),
        upload_dir: upload_dir.to_string_lossy().to_string(),
        public_url: "http://localhost:8080".to_string(),
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
        test_mode: true,
    };

    let store = Store::open(&data_dir).expect("Failed to open test document store");
    let objects = LocalStore::new(&upload_dir).expect("Failed to create test upload store");
    let gallery = Gallery::new(store, Arc::new(objects), config.public_url.clone());

    Arc::new(AppState { config, gallery })
}
