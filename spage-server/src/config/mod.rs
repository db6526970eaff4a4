//! Configuration module for spage-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    ConfigStore, DirectoryConfig, RealtimeConfig, ServerConfig, SharedConfig,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Environment variable that overrides `[directory] secret_key`.
pub const DIRECTORY_SECRET_ENV: &str = "DIRECTORY_SECRET_KEY";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub realtime: RealtimeConfig,
    pub directory: DirectoryConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with one lock per section.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            realtime: ConfigStore::new(self.realtime),
            directory: Arc::new(RwLock::new(self.directory)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI and environment overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let file_config: FileConfig = toml::from_str(&config_content)?;
        let secret_env = std::env::var(DIRECTORY_SECRET_ENV).ok();
        self.build(file_config, secret_env)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn build(
        &self,
        mut file_config: FileConfig,
        secret_env: Option<String>,
    ) -> Result<LoadedConfig, ConfigError> {
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        if let Some(secret) = secret_env {
            file_config.directory.secret_key = Some(secret);
        }

        validate(&file_config)?;

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: file_config.server.listen,
            },
            realtime: RealtimeConfig {
                send_timeout: Duration::from_millis(file_config.realtime.send_timeout_ms),
                outbox_capacity: file_config.realtime.outbox_capacity,
            },
            directory: DirectoryConfig {
                api_base: file_config.directory.api_base,
                secret_key: file_config
                    .directory
                    .secret_key
                    .filter(|s| !s.trim().is_empty()),
                timeout: Duration::from_secs(file_config.directory.timeout_secs),
            },
        })
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.realtime.send_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "realtime.send_timeout_ms must be greater than 0".into(),
        ));
    }
    if config.realtime.outbox_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "realtime.outbox_capacity must be greater than 0".into(),
        ));
    }
    if config.directory.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "directory.timeout_secs must be greater than 0".into(),
        ));
    }
    let scheme = config.directory.api_base.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::ValidationError(format!(
            "directory.api_base must be an http(s) URL, got scheme {scheme}"
        )));
    }
    Ok(())
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> FileConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_listen_override_wins() {
        let listen: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        let loader = ConfigLoader::new("unused.toml", Some(listen));
        let loaded = loader
            .build(parse("[server]\nlisten = \"0.0.0.0:1\"\n"), None)
            .unwrap();
        assert_eq!(loaded.server.listen, listen);
    }

    #[test]
    fn test_secret_env_overrides_file() {
        let loader = ConfigLoader::new("unused.toml", None);
        let loaded = loader
            .build(
                parse("[directory]\nsecret_key = \"from-file\"\n"),
                Some("from-env".into()),
            )
            .unwrap();
        assert_eq!(loaded.directory.secret_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_blank_secret_is_unset() {
        let loader = ConfigLoader::new("unused.toml", None);
        let loaded = loader
            .build(parse("[directory]\nsecret_key = \"  \"\n"), None)
            .unwrap();
        assert!(loaded.directory.secret_key.is_none());
    }

    #[test]
    fn test_realtime_durations() {
        let loader = ConfigLoader::new("unused.toml", None);
        let loaded = loader
            .build(parse("[realtime]\nsend_timeout_ms = 1500\n"), None)
            .unwrap();
        assert_eq!(loaded.realtime.send_timeout, Duration::from_millis(1500));
        assert_eq!(loaded.realtime.outbox_capacity, 64);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let loader = ConfigLoader::new("unused.toml", None);
        let err = loader
            .build(parse("[realtime]\noutbox_capacity = 0\n"), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_non_http_directory_is_rejected() {
        let loader = ConfigLoader::new("unused.toml", None);
        let err = loader
            .build(parse("[directory]\napi_base = \"ftp://example.com\"\n"), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let loader = ConfigLoader::new("/nonexistent/spage-config.toml", None);
        assert!(matches!(loader.load(), Err(ConfigError::IoError(_))));
    }
}
