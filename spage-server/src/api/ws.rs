//! Live event stream.
//!
//! # Endpoints
//!
//! - `GET /ws`          – every event of every organization
//! - `GET /ws/{org_id}` – every event, plus a second copy of `org_id`'s events
//!
//! Each socket gets one task. The task registers a connection, writes
//! whatever the broadcast engine queues into its outbox, echoes text frames
//! back to the client and unregisters when it ends.

use axum::{
    Router,
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use spage_core::realtime::ConnectionHandle;
use spage_sdk::objects::{GLOBAL_SUBSCRIPTION_PATH, WsCloseCode};

use crate::state::AppState;

/// Build the WebSocket router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(GLOBAL_SUBSCRIPTION_PATH, get(global_ws))
        .route("/ws/{org_id}", get(organization_ws))
}

/// `GET /ws`: subscribe to every organization.
async fn global_ws(state: State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_subscriber(socket, app_state, None))
}

/// `GET /ws/{org_id}`: subscribe to every organization and, a second
/// time, to `org_id`. The id is not checked against anything.
async fn organization_ws(
    state: State<AppState>,
    Path(org_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_subscriber(socket, app_state, Some(org_id)))
}

/// Why a subscriber task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// The client closed, errored or stopped reading.
    PeerGone,
    /// The server is shutting down.
    Shutdown,
    /// The broadcast engine dropped this connection after a failed delivery.
    Reaped,
}

impl Exit {
    fn close_frame(self) -> Option<CloseFrame> {
        match self {
            Exit::PeerGone => None,
            Exit::Shutdown => Some(CloseFrame {
                code: WsCloseCode::GOING_AWAY,
                reason: "server shutting down".into(),
            }),
            Exit::Reaped => Some(CloseFrame {
                code: WsCloseCode::SLOW_CONSUMER,
                reason: "subscriber too slow".into(),
            }),
        }
    }
}

/// Background task that drives a single subscriber connection.
async fn handle_subscriber(mut socket: WebSocket, state: AppState, org_id: Option<String>) {
    let capacity = state.config.realtime.read().await.outbox_capacity;
    let (handle, mut outbox) = ConnectionHandle::open(capacity);
    let connection_id = handle.id();
    state.registry.register(handle, org_id.as_deref()).await;
    tracing::info!(%connection_id, org_id = org_id.as_deref().unwrap_or("-"), "WS: subscriber connected");

    let mut shutdown_rx = state.shutdown_rx.clone();
    let exit = if *shutdown_rx.borrow() {
        Exit::Shutdown
    } else {
        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break Exit::Shutdown;
                    }
                }

                // Encoded event queued by the broadcast engine
                payload = outbox.recv() => {
                    let Some(payload) = payload else {
                        // every sender is gone: the registry no longer holds us
                        break Exit::Reaped;
                    };
                    if socket.send(Message::Text(payload.as_ref().to_owned().into())).await.is_err() {
                        break Exit::PeerGone;
                    }
                }

                // Incoming WebSocket frame from the client
                msg = socket.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if socket.send(Message::Text(text)).await.is_err() {
                                break Exit::PeerGone;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break Exit::PeerGone,
                        Some(Ok(_)) => {
                            // Ignore binary, ping and pong frames
                        }
                        Some(Err(e)) => {
                            tracing::debug!(%connection_id, error = %e, "WS: receive failed");
                            break Exit::PeerGone;
                        }
                    }
                }
            }
        }
    };

    state
        .registry
        .unregister(connection_id, org_id.as_deref())
        .await;
    if let Some(frame) = exit.close_frame() {
        let _ = socket.send(Message::Close(Some(frame))).await;
    }
    tracing::info!(%connection_id, ?exit, "WS: subscriber disconnected");
}
