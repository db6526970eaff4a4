use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identity of one subscriber connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Receiving side of a connection; owned by the socket task.
pub type Outbox = mpsc::Receiver<Arc<str>>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The socket task is gone.
    #[error("connection closed")]
    Closed,
    /// The outbox stayed full for the whole send timeout.
    #[error("send timed out after {0:?}")]
    TimedOut(Duration),
}

/// The registry's view of a subscriber: an id and a bounded queue into
/// the socket task that writes frames.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbox: mpsc::Sender<Arc<str>>,
}

impl ConnectionHandle {
    /// Create a handle and the outbox its socket task drains.
    ///
    /// A capacity of zero is treated as one.
    pub fn open(capacity: usize) -> (Self, Outbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                id: ConnectionId::new(),
                outbox: tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue one encoded event, waiting at most `send_timeout` for room.
    pub async fn deliver(
        &self,
        payload: Arc<str>,
        send_timeout: Duration,
    ) -> Result<(), DeliveryError> {
        match tokio::time::timeout(send_timeout, self.outbox.send(payload)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(DeliveryError::Closed),
            Err(_) => Err(DeliveryError::TimedOut(send_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_reaches_outbox() {
        let (handle, mut outbox) = ConnectionHandle::open(4);
        handle
            .deliver(Arc::from("hello"), Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(outbox.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_deliver_to_dropped_outbox_is_closed() {
        let (handle, outbox) = ConnectionHandle::open(4);
        drop(outbox);
        let err = handle
            .deliver(Arc::from("hello"), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err, DeliveryError::Closed);
    }

    #[tokio::test]
    async fn test_deliver_to_full_outbox_times_out() {
        let (handle, _outbox) = ConnectionHandle::open(1);
        handle
            .deliver(Arc::from("first"), Duration::from_millis(50))
            .await
            .unwrap();
        let err = handle
            .deliver(Arc::from("second"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::TimedOut(_)));
    }

    #[test]
    fn test_ids_are_unique() {
        let (a, _ra) = ConnectionHandle::open(1);
        let (b, _rb) = ConnectionHandle::open(1);
        assert_ne!(a.id(), b.id());
    }
}
