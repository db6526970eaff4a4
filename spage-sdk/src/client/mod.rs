//! Typed clients for the spage REST API and live event stream.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest` or `tokio-tungstenite`.

mod events;
mod status;

pub use events::EventSubscriber;
pub use status::StatusClient;

use reqwest::StatusCode;
use url::Url;

/// Errors produced by the SDK clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body or event frame could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The WebSocket handshake or stream failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Resolve an endpoint path below `base`, keeping any path prefix the base
/// carries (`https://example.com/status` + `/services` →
/// `https://example.com/status/services`).
pub(crate) fn endpoint_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    base.join(path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_at_root() {
        let base = Url::parse("https://status.example.com").unwrap();
        assert_eq!(
            endpoint_url(&base, "/services").unwrap().as_str(),
            "https://status.example.com/services"
        );
    }

    #[test]
    fn test_endpoint_url_keeps_path_prefix() {
        for base in ["https://example.com/status", "https://example.com/status/"] {
            let base = Url::parse(base).unwrap();
            assert_eq!(
                endpoint_url(&base, "/incidents/9/updates").unwrap().as_str(),
                "https://example.com/status/incidents/9/updates"
            );
            assert_eq!(
                endpoint_url(&base, "/ws/org_42").unwrap().as_str(),
                "https://example.com/status/ws/org_42"
            );
        }
    }
}
