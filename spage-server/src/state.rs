//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use spage_core::framework::DatabaseProcessor;
use spage_core::processors::{EventPublisher, OrganizationDirectory};
use spage_core::realtime::{BroadcastEngine, ConnectionRegistry};
use sqlx::PgPool;
use tokio::sync::watch;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database processor wrapping the connection pool.
    pub db: DatabaseProcessor,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Live subscribers.
    pub registry: ConnectionRegistry,
    /// Encodes committed mutations and broadcasts them.
    pub events: EventPublisher,
    /// Organization name lookup.
    pub directory: OrganizationDirectory,
    /// Flips to `true` when the server starts shutting down.
    pub shutdown_rx: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(pool: PgPool, config: SharedConfig, shutdown_rx: watch::Receiver<bool>) -> Self {
        let registry = ConnectionRegistry::new();
        let engine = BroadcastEngine::new(registry.clone(), config.realtime.clone());
        Self {
            db: DatabaseProcessor { pool },
            directory: OrganizationDirectory::new(config.directory.clone()),
            events: EventPublisher::new(engine),
            registry,
            config,
            shutdown_rx,
        }
    }
}
