//! Configuration types for spage.
//!
//! These types represent the validated runtime configuration used by the server
//! and can be shared across crates. The actual config loading/parsing is handled
//! by the server crate.

mod config_store;

pub use config_store::ConfigStore;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

/// Default time a single delivery may wait on a full outbox.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);
/// Default number of encoded events buffered per connection.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;
/// Default timeout of an organization directory lookup.
pub const DEFAULT_DIRECTORY_TIMEOUT: Duration = Duration::from_secs(10);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Fan-out tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// How long one delivery may wait before the connection is declared dead.
    pub send_timeout: Duration,
    /// Bounded queue length between the broadcast engine and a socket task.
    pub outbox_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

/// Where organization display names are looked up.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub api_base: Url,
    /// Bearer token; lookups fail with `NotConfigured` while this is unset.
    pub secret_key: Option<String>,
    pub timeout: Duration,
}

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Broadcast timeout and outbox size, read on every broadcast.
    pub realtime: ConfigStore<RealtimeConfig>,
    /// Organization directory endpoint and credentials.
    pub directory: Arc<RwLock<DirectoryConfig>>,
}
