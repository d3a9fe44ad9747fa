//! Service configuration

use serde::Deserialize;

/// HTTP server configuration
///
/// # Environment Variables
/// - `API_HOST`: Bind address (default: 0.0.0.0)
/// - `API_PORT`: Bind port (default: 3001)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        common::settings::from_env("API")
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which reservation store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

/// Storage configuration
///
/// # Environment Variables
/// - `STORAGE_BACKEND`: `postgres` or `memory` (default: postgres)
/// - `STORAGE_FALLBACK_READS`: Serve fixed data while the database is down (default: true)
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_fallback_reads")]
    pub fallback_reads: bool,
}

fn default_fallback_reads() -> bool {
    true
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        common::settings::from_env("STORAGE")
    }
}
