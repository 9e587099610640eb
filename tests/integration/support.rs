use std::sync::Arc;

use tempfile::TempDir;
use treedrive::config::{DriveConfig, ServerConfig, StorageConfig};
use treedrive::{DriveApi, DriveHandler};

pub fn test_config(temp_dir: &TempDir) -> DriveConfig {
    DriveConfig {
        storage: StorageConfig {
            path: Some(temp_dir.path().join("store")),
        },
        ..DriveConfig::default()
    }
}

pub fn create_test_api() -> (Arc<DriveApi>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let api = DriveApi::open(&test_config(&temp_dir)).unwrap();
    (Arc::new(api), temp_dir)
}

pub fn create_test_handler(debug: bool) -> (DriveHandler, TempDir) {
    let (api, temp_dir) = create_test_api();
    let server = ServerConfig {
        debug,
        ..ServerConfig::default()
    };
    (DriveHandler::new(api, server), temp_dir)
}

/// Strip the success prefix and parse the JSON body
pub fn json_body(body: &str) -> serde_json::Value {
    let json = body
        .strip_prefix("while(1);")
        .unwrap_or_else(|| panic!("missing prefix: {}", body));
    serde_json::from_str(json).unwrap()
}
