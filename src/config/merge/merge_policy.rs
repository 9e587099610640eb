//! Built-in defaults forming the lowest-precedence layer.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with default values.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("transactions.max_retries", 8i64)?
        .set_default("transactions.retry_delay_ms", 2i64)?
        .set_default("server.debug", false)?
        .set_default("server.xssi_prefix", crate::config::default_xssi_prefix())
}
