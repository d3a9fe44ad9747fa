//! Environment driven configuration
//!
//! Every configuration struct in the workspace is a serde type with defaults,
//! filled from the environment variables that share a prefix. For example
//! `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS` populate the `url` and
//! `max_connections` fields of a struct loaded with the `DATABASE` prefix.

use config::{Config, ConfigError, Environment};
use serde::de::DeserializeOwned;

/// Load `T` from the environment variables starting with `{prefix}_`
pub fn from_env<T: DeserializeOwned>(prefix: &str) -> Result<T, ConfigError> {
    Config::builder()
        .add_source(Environment::with_prefix(prefix).try_parsing(true))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default = "default_name")]
        name: String,
        #[serde(default)]
        port: u16,
        #[serde(default)]
        enabled: bool,
    }

    fn default_name() -> String {
        "fallback".to_string()
    }

    #[test]
    #[serial]
    fn test_defaults_apply_without_variables() {
        let sample: Sample = from_env("SETTINGS_SAMPLE").unwrap();
        assert_eq!(sample.name, "fallback");
        assert_eq!(sample.port, 0);
        assert!(!sample.enabled);
    }

    #[test]
    #[serial]
    fn test_prefixed_variables_are_parsed() {
        unsafe {
            std::env::set_var("SETTINGS_SAMPLE_NAME", "rooms");
            std::env::set_var("SETTINGS_SAMPLE_PORT", "8080");
            std::env::set_var("SETTINGS_SAMPLE_ENABLED", "true");
        }

        let sample: Sample = from_env("SETTINGS_SAMPLE").unwrap();
        assert_eq!(sample.name, "rooms");
        assert_eq!(sample.port, 8080);
        assert!(sample.enabled);

        unsafe {
            std::env::remove_var("SETTINGS_SAMPLE_NAME");
            std::env::remove_var("SETTINGS_SAMPLE_PORT");
            std::env::remove_var("SETTINGS_SAMPLE_ENABLED");
        }
    }
}
