//! WebSocket subscription protocol.
//!
//! Two endpoints accept subscribers:
//!
//! - `GET /ws` receives every event of every organization.
//! - `GET /ws/{org_id}` receives every event of every organization *and*,
//!   a second time, every event of `org_id`.
//!
//! # Protocol
//!
//! 1. The server never acknowledges the handshake beyond the upgrade.
//! 2. Each committed mutation is pushed as one text frame holding an
//!    [`EventEnvelope`](super::events::EventEnvelope) JSON object.
//! 3. Text frames sent by the client are echoed back verbatim and are
//!    otherwise ignored; they are useful as keepalives.
//! 4. Events are not replayed. A client that reconnects should re-read
//!    `/services` and `/incidents` to reconcile.
//! 5. If the server drops a subscriber that could not keep up, it sends a
//!    close frame with [`WsCloseCode::SLOW_CONSUMER`].

/// Path of the global subscription endpoint.
pub const GLOBAL_SUBSCRIPTION_PATH: &str = "/ws";

/// Build the subscription path for an optional organization scope.
///
/// The organization id is not escaped; callers that accept arbitrary ids
/// should percent-encode them first.
pub fn subscription_path(org_id: Option<&str>) -> String {
    match org_id {
        Some(org_id) => format!("{GLOBAL_SUBSCRIPTION_PATH}/{org_id}"),
        None => GLOBAL_SUBSCRIPTION_PATH.to_owned(),
    }
}

/// Well-known WebSocket close codes used by the event stream.
///
/// Codes in the 4000–4999 range are reserved for application use by
/// [RFC 6455 §7.4.2](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.2).
pub struct WsCloseCode;

impl WsCloseCode {
    /// The server is shutting down.
    pub const GOING_AWAY: u16 = 1001;

    /// The subscriber was removed from the registry because a delivery
    /// failed or timed out.
    pub const SLOW_CONSUMER: u16 = 4008;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_path() {
        assert_eq!(subscription_path(None), "/ws");
        assert_eq!(subscription_path(Some("org_42")), "/ws/org_42");
    }
}
