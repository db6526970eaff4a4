//! TOML file configuration structures.
//!
//! These structs directly map to the `spage-config.toml` file format. Every
//! section is optional.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8000").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8000))
}

/// Live event fan-out section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Milliseconds a delivery may wait on a subscriber's full queue before
    /// the subscriber is dropped.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Events buffered per subscriber.
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            outbox_capacity: default_outbox_capacity(),
        }
    }
}

fn default_send_timeout_ms() -> u64 {
    spage_core::config::DEFAULT_SEND_TIMEOUT.as_millis() as u64
}

fn default_outbox_capacity() -> usize {
    spage_core::config::DEFAULT_OUTBOX_CAPACITY
}

/// Organization directory section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_api_base")]
    pub api_base: Url,
    /// Bearer token for the directory. Overridden by `DIRECTORY_SECRET_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default = "default_directory_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            secret_key: None,
            timeout_secs: default_directory_timeout_secs(),
        }
    }
}

fn default_api_base() -> Url {
    Url::parse("https://api.clerk.dev/v1").expect("valid default directory URL")
}

fn default_directory_timeout_secs() -> u64 {
    spage_core::config::DEFAULT_DIRECTORY_TIMEOUT.as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[realtime]
send_timeout_ms = 250
outbox_capacity = 16

[directory]
api_base = "https://directory.example.com/v1"
secret_key = "sk_test_123"
timeout_secs = 3
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.realtime.send_timeout_ms, 250);
        assert_eq!(config.realtime.outbox_capacity, 16);
        assert_eq!(
            config.directory.api_base.as_str(),
            "https://directory.example.com/v1"
        );
        assert_eq!(config.directory.secret_key.as_deref(), Some("sk_test_123"));
        assert_eq!(config.directory.timeout_secs, 3);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen.port(), 8000);
        assert_eq!(config.realtime.send_timeout_ms, 5000);
        assert_eq!(config.realtime.outbox_capacity, 64);
        assert_eq!(config.directory.api_base.as_str(), "https://api.clerk.dev/v1");
        assert!(config.directory.secret_key.is_none());
    }

    #[test]
    fn test_partial_section_fills_missing_keys() {
        let config: FileConfig = toml::from_str("[realtime]\nsend_timeout_ms = 100\n").unwrap();
        assert_eq!(config.realtime.send_timeout_ms, 100);
        assert_eq!(config.realtime.outbox_capacity, 64);
    }
}
