//! Axum server setup and router configuration.

use crate::api;
use crate::state::AppState;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;
use spage_sdk::objects::format_timestamp;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        // Health check endpoint
        .route("/health", get(health_check))
        .merge(api::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        // Add state to all routes
        .with_state(state)
}

/// API banner.
#[derive(Serialize)]
struct IndexResponse {
    message: &'static str,
    version: &'static str,
    endpoints: IndexEndpoints,
}

#[derive(Serialize)]
struct IndexEndpoints {
    services: &'static str,
    incidents: &'static str,
    organizations: &'static str,
    health: &'static str,
    websocket: &'static str,
}

async fn index() -> impl IntoResponse {
    Json(IndexResponse {
        message: "Status Page API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: IndexEndpoints {
            services: "/services",
            incidents: "/incidents",
            organizations: "/organizations/{org_id}",
            health: "/health",
            websocket: "/ws",
        },
    })
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: String,
    /// Live WebSocket subscribers.
    subscribers: usize,
}

/// Simple health check - returns OK if the server is running.
async fn health_check(state: State<AppState>) -> impl IntoResponse {
    let stats = state.registry.stats().await;
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: format_timestamp(time::OffsetDateTime::now_utc()),
        subscribers: stats.global,
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(
    router: Router,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
