//! Service configuration

use serde::Deserialize;

/// HTTP server configuration
///
/// # Environment Variables
/// - `AUTH_HOST`: Bind address (default: 0.0.0.0)
/// - `AUTH_PORT`: Bind port (default: 3000)
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
    3000
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        common::settings::from_env("AUTH")
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
