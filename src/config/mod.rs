//! Configuration
//!
//! Layered settings loaded through the `config` crate. Precedence from lowest
//! to highest: built-in defaults, the global `config.toml`, an explicit file,
//! then `TREEDRIVE__<SECTION>__<KEY>` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod storage;

pub use crate::concurrency::TransactionConfig;
pub use crate::logging::LoggingConfig;
pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use storage::StorageConfig;

use serde::{Deserialize, Serialize};

/// Boundary-layer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Emit detailed error messages instead of a generic one
    #[serde(default)]
    pub debug: bool,

    /// Prefix placed before every JSON success body
    #[serde(default = "default_xssi_prefix")]
    pub xssi_prefix: String,
}

pub(crate) fn default_xssi_prefix() -> String {
    "while(1);".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            xssi_prefix: default_xssi_prefix(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub transactions: TransactionConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DriveConfig {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, crate::error::ApiError> {
        toml::to_string_pretty(self).map_err(|e| {
            crate::error::ApiError::ConfigError(format!("Failed to serialize config: {}", e))
        })
    }
}
