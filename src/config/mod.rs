//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Hosted data service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Root URL of the hosted service.
    #[serde(default = "default_service_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Change-detection poll cadence (e.g. "15s", "1m").
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
}

fn default_service_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_api_key_env() -> String {
    "DUELBOARD_API_KEY".to_string()
}

fn default_poll_interval() -> String {
    "15s".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_service_url(),
            api_key_env: default_api_key_env(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl ServiceConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }

    /// Parsed poll cadence.
    pub fn poll_interval_duration(&self) -> Option<Duration> {
        crate::parse_duration(&self.poll_interval)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Avatar storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Storage bucket for avatar uploads.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Upload size limit in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_bucket() -> String {
    "avatars".to_string()
}

fn default_max_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            max_bytes: default_max_bytes(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub avatars: AvatarConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            service: ServiceConfig::default(),
            server: ServerConfig::default(),
            avatars: AvatarConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Url::parse(&self.service.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Service base URL is not a valid URL: {}",
                self.service.base_url
            )));
        }

        match self.service.poll_interval_duration() {
            None => {
                return Err(ConfigError::ValidationError(format!(
                    "Poll interval is not a valid duration: {}",
                    self.service.poll_interval
                )))
            }
            Some(d) if d.is_zero() => {
                return Err(ConfigError::ValidationError(
                    "Poll interval must be greater than 0".to_string(),
                ))
            }
            Some(_) => {}
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.avatars.bucket.is_empty() {
            return Err(ConfigError::ValidationError(
                "Avatar bucket must not be empty".to_string(),
            ));
        }

        if self.avatars.max_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "Avatar size limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.service.base_url, "http://localhost:54321");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.avatars.bucket, "avatars");
    }

    #[test]
    fn test_default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_poll_interval() {
        let mut config = AppConfig::default();
        config.service.poll_interval = "soon".to_string();
        assert!(config.validate().is_err());

        config.service.poll_interval = "0s".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_base_url() {
        let mut config = AppConfig::default();
        config.service.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_avatar_settings() {
        let mut config = AppConfig::default();
        config.avatars.bucket = String::new();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.avatars.max_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval_parses() {
        let config = ServiceConfig::default();
        assert_eq!(
            config.poll_interval_duration(),
            Some(Duration::from_secs(15))
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.server.port, parsed.server.port);
        assert_eq!(config.service.base_url, parsed.service.base_url);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
log_level = "debug"

[service]
base_url = "https://example.supabase.co"
poll_interval = "30s"

[server]
port = 9090
"#
        )
        .unwrap();

        let config = AppConfig::from_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.service.base_url, "https://example.supabase.co");
        assert_eq!(config.server.port, 9090);
        // Sections not present fall back to defaults.
        assert_eq!(config.avatars.bucket, "avatars");
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
port = 0
"#
        )
        .unwrap();

        assert!(AppConfig::from_file(&file.path().to_path_buf()).is_err());
    }
}
