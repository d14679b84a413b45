//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults, so a bare `cargo run` starts a working dev server.

use std::env;

use atlas_db::SettlementConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    /// Path to the SQLite database file
    pub database_path: String,

    /// Whether settlement posts cost-of-goods journals
    pub track_cogs: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = ApiConfig {
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "./atlas.db".to_string()),

            track_cogs: env::var("TRACK_COGS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TRACK_COGS".to_string()))?,
        };

        Ok(config)
    }

    /// The settlement business config derived from this server config.
    pub fn settlement(&self) -> SettlementConfig {
        SettlementConfig {
            track_cogs: self.track_cogs,
            ..SettlementConfig::default()
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
