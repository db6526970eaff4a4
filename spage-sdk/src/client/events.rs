//! Live event stream client.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::{ClientError, endpoint_url};
use crate::objects::EventEnvelope;
use crate::objects::ws::subscription_path;

/// A subscription to `/ws` or `/ws/{org_id}`.
///
/// Call [`next_event`](EventSubscriber::next_event) in a loop; it yields
/// `None` once the server closes the stream.
pub struct EventSubscriber {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl EventSubscriber {
    /// Open a subscription.
    ///
    /// `base_url` may use `http(s)` or `ws(s)`; the HTTP schemes are mapped
    /// to their WebSocket counterparts. With `org_id` set, the subscriber
    /// receives that organization's events twice (once from the global
    /// fan-out and once from the organization fan-out).
    pub async fn connect(base_url: &Url, org_id: Option<&str>) -> Result<Self, ClientError> {
        let mut url = base_url.clone();
        let ws_scheme = match url.scheme() {
            "http" => Some("ws"),
            "https" => Some("wss"),
            _ => None,
        };
        if let Some(scheme) = ws_scheme {
            // Switching between the special schemes http(s) and ws(s) is always allowed.
            let _ = url.set_scheme(scheme);
        }

        let encoded = org_id.map(urlencoding::encode);
        let url = endpoint_url(&url, &subscription_path(encoded.as_deref()))?;

        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
        Ok(Self { stream })
    }

    /// Wait for the next event.
    ///
    /// Ping/pong and echoed frames that are not events are skipped.
    pub async fn next_event(&mut self) -> Option<Result<EventEnvelope, ClientError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str(&text) {
                    Ok(event) => return Some(Ok(event)),
                    Err(e) if text.trim_start().starts_with('{') => {
                        return Some(Err(ClientError::Json(e)));
                    }
                    Err(_) => continue,
                },
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    /// Send a ping so intermediaries keep the connection open.
    pub async fn keepalive(&mut self) -> Result<(), ClientError> {
        self.stream.send(Message::Ping(Vec::new())).await?;
        Ok(())
    }

    /// Close the subscription.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
