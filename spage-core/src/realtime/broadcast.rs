//! Event fan-out to registered subscribers.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use super::connection::{ConnectionHandle, ConnectionId};
use super::registry::ConnectionRegistry;
use crate::config::{ConfigStore, RealtimeConfig};
use crate::events::{DomainEvent, EventError};

/// Outcome of one broadcast call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    /// Connections in the snapshot.
    pub attempted: usize,
    pub delivered: usize,
    /// Registry entries removed because their delivery failed.
    pub reaped: usize,
}

impl BroadcastReport {
    pub fn merge(self, other: BroadcastReport) -> BroadcastReport {
        BroadcastReport {
            attempted: self.attempted + other.attempted,
            delivered: self.delivered + other.delivered,
            reaped: self.reaped + other.reaped,
        }
    }
}

/// Delivers encoded events to the global set or one organization's set.
///
/// Each call snapshots its target set, delivers to every connection
/// concurrently, then removes the connections that failed from every set.
/// A failure never stops delivery to the others and is never retried.
#[derive(Clone)]
pub struct BroadcastEngine {
    registry: ConnectionRegistry,
    config: ConfigStore<RealtimeConfig>,
}

impl BroadcastEngine {
    pub fn new(registry: ConnectionRegistry, config: ConfigStore<RealtimeConfig>) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Send `event` to every live connection.
    pub async fn broadcast_to_all(&self, event: &DomainEvent) -> Result<BroadcastReport, EventError> {
        let targets = self.registry.global_snapshot().await;
        self.deliver(event, targets, "all").await
    }

    /// Send `event` to the connections subscribed to `org_id`.
    ///
    /// Connections that are also in the global set receive the event once
    /// per call, so a scoped subscriber sees it twice after both broadcasts.
    pub async fn broadcast_to_organization(
        &self,
        event: &DomainEvent,
        org_id: &str,
    ) -> Result<BroadcastReport, EventError> {
        let targets = self.registry.organization_snapshot(org_id).await;
        self.deliver(event, targets, org_id).await
    }

    async fn deliver(
        &self,
        event: &DomainEvent,
        targets: Vec<ConnectionHandle>,
        label: &str,
    ) -> Result<BroadcastReport, EventError> {
        if targets.is_empty() {
            debug!(event_type = %event.kind(), label, "no subscribers");
            return Ok(BroadcastReport::default());
        }

        let payload = event.to_json()?;
        let send_timeout = self.config.read().await.send_timeout;

        let results = join_all(targets.iter().map(|connection| {
            let payload = Arc::clone(&payload);
            async move { (connection.id(), connection.deliver(payload, send_timeout).await) }
        }))
        .await;

        let mut dead: HashSet<ConnectionId> = HashSet::new();
        let mut delivered = 0;
        for (id, result) in results {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(connection_id = %id, label, error = %e, "dropping subscriber");
                    dead.insert(id);
                }
            }
        }

        let reaped = self.registry.reap(&dead).await;
        debug!(
            event_type = %event.kind(),
            label,
            recipients = targets.len(),
            delivered,
            reaped,
            "broadcast event"
        );
        Ok(BroadcastReport {
            attempted: targets.len(),
            delivered,
            reaped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ServiceStatus;
    use crate::entities::service::ServiceRecord;
    use crate::events::Mutation;
    use std::time::Duration;

    fn engine(send_timeout: Duration) -> BroadcastEngine {
        BroadcastEngine::new(
            ConnectionRegistry::new(),
            ConfigStore::new(RealtimeConfig {
                send_timeout,
                outbox_capacity: 8,
            }),
        )
    }

    fn service(id: i64, org_id: &str) -> ServiceRecord {
        ServiceRecord {
            id,
            org_id: org_id.into(),
            name: format!("service-{id}"),
            description: String::new(),
            status: ServiceStatus::Operational,
            uptime: "100.00%".into(),
            link: String::new(),
        }
    }

    fn event(id: i64, org_id: &str) -> DomainEvent {
        Mutation::ServiceCreated(&service(id, org_id))
            .encode()
            .unwrap()
    }

    #[tokio::test]
    async fn test_scoped_subscriber_gets_event_twice() {
        let engine = engine(Duration::from_millis(100));
        let (a, mut rx_a) = ConnectionHandle::open(8);
        let (b, mut rx_b) = ConnectionHandle::open(8);
        engine.registry().register(a, Some("acme")).await;
        engine.registry().register(b, None).await;

        let event = event(1, "acme");
        let all = engine.broadcast_to_all(&event).await.unwrap();
        let org = engine.broadcast_to_organization(&event, "acme").await.unwrap();
        assert_eq!(all.delivered, 2);
        assert_eq!(org.delivered, 1);

        let expected = event.to_json().unwrap();
        assert_eq!(rx_a.recv().await, Some(Arc::clone(&expected)));
        assert_eq!(rx_a.recv().await, Some(Arc::clone(&expected)));
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.recv().await, Some(expected));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_organization_is_noop() {
        let engine = engine(Duration::from_millis(100));
        let (a, mut rx_a) = ConnectionHandle::open(8);
        engine.registry().register(a, Some("acme")).await;

        let report = engine
            .broadcast_to_organization(&event(1, "globex"), "globex")
            .await
            .unwrap();
        assert_eq!(report, BroadcastReport::default());
        assert!(rx_a.try_recv().is_err());
        assert_eq!(engine.registry().stats().await.global, 1);
    }

    #[tokio::test]
    async fn test_failed_connection_is_reaped_and_not_retried() {
        let engine = engine(Duration::from_millis(100));
        let (dead, dead_rx) = ConnectionHandle::open(8);
        let (live, mut live_rx) = ConnectionHandle::open(8);
        engine.registry().register(dead.clone(), Some("acme")).await;
        engine.registry().register(live, Some("acme")).await;
        drop(dead_rx);

        let report = engine.broadcast_to_all(&event(1, "acme")).await.unwrap();
        assert_eq!(
            report,
            BroadcastReport {
                attempted: 2,
                delivered: 1,
                reaped: 1
            }
        );
        assert!(
            engine
                .registry()
                .organization_snapshot("acme")
                .await
                .iter()
                .all(|c| c.id() != dead.id())
        );

        let report = engine
            .broadcast_to_organization(&event(2, "acme"), "acme")
            .await
            .unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(report.reaped, 0);
        assert!(live_rx.recv().await.is_some());
        assert!(live_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_org_failure_is_removed_from_global() {
        let engine = engine(Duration::from_millis(100));
        let (dead, dead_rx) = ConnectionHandle::open(8);
        engine.registry().register(dead, Some("acme")).await;
        drop(dead_rx);

        let report = engine
            .broadcast_to_organization(&event(1, "acme"), "acme")
            .await
            .unwrap();
        assert_eq!(report.reaped, 1);
        assert!(engine.registry().global_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_stalled_connection_does_not_block_others() {
        let engine = engine(Duration::from_millis(20));
        let (stalled, _stalled_rx) = ConnectionHandle::open(1);
        let (live, mut live_rx) = ConnectionHandle::open(8);
        engine.registry().register(stalled, None).await;
        engine.registry().register(live, None).await;

        let first = engine.broadcast_to_all(&event(1, "acme")).await.unwrap();
        assert_eq!(first.delivered, 2);
        // the stalled outbox is now full and never drained
        let second = engine.broadcast_to_all(&event(2, "acme")).await.unwrap();
        assert_eq!(second.delivered, 1);
        assert_eq!(second.reaped, 1);
        assert_eq!(engine.registry().stats().await.global, 1);
        assert!(live_rx.recv().await.is_some());
        assert!(live_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_events_arrive_in_broadcast_order() {
        let engine = engine(Duration::from_millis(100));
        let (a, mut rx_a) = ConnectionHandle::open(8);
        engine.registry().register(a, None).await;

        let events: Vec<DomainEvent> = (1..=3).map(|id| event(id, "acme")).collect();
        for event in &events {
            engine.broadcast_to_all(event).await.unwrap();
        }
        for event in &events {
            assert_eq!(rx_a.recv().await, Some(event.to_json().unwrap()));
        }
    }
}
