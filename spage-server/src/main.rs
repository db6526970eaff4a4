//! spage server
//!
//! A multi-tenant status page backend with live event streams.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::{shutdown_and_notify, spawn_config_reload_handler};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Status page API with live WebSocket updates
#[derive(Parser, Debug)]
#[command(name = "spage-server", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, default_value = "./spage-config.toml")]
    config: PathBuf,

    /// Listen address, overrides `[server] listen`
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Apply pending migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    tracing::info!("spage-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded = config_loader
        .load()
        .inspect_err(|e| tracing::error!(path = ?args.config, error = %e, "Bad configuration"))?;
    let listen_addr = loaded.server.listen;
    if loaded.directory.secret_key.is_none() {
        tracing::warn!("No directory secret configured, organization lookups will fail");
    }

    let db_pool = open_database(args.migrate).await?;

    // flipped by the shutdown future; subscriber tasks close with 1001
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = AppState::new(db_pool.clone(), loaded.into_shared(), shutdown_rx);
    let reload_stop = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state);
    let result = run_server(router, listen_addr, shutdown_and_notify(shutdown_tx)).await;

    reload_stop.notify_one();
    db_pool.close().await;
    tracing::info!("spage-server stopped");
    result.map_err(Into::into)
}

/// Connect to `DATABASE_URL`, applying pending migrations when asked.
async fn open_database(migrate: bool) -> anyhow::Result<PgPool> {
    let database_url =
        get_database_url().inspect_err(|_| tracing::error!("DATABASE_URL is not set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Database connection failed"))?;

    if migrate {
        sqlx::migrate!("../migrations")
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Migrations failed"))?;
        tracing::info!("Migrations applied");
    }
    Ok(pool)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
