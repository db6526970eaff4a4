//! Glue between committed mutations and the broadcast engine.
//!
//! A mutating handler takes its organization's turn with
//! [`EventPublisher::begin`] before writing, and holds it until
//! [`EventPublisher::publish`] returns. Writers of one organization
//! therefore commit and publish one at a time, and its subscribers see
//! events in commit order. Different organizations never wait on each
//! other.
//!
//! The event goes to every subscriber first, then to the owning
//! organization's subscribers. Publishing never fails the request: encode
//! and serialization errors are logged and dropped.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use kanau::processor::Processor;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error};

use crate::events::{DomainEvent, Mutation};
use crate::realtime::{BroadcastEngine, BroadcastReport};

/// Per-scope outcome of publishing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublishReport {
    pub global: BroadcastReport,
    pub organization: BroadcastReport,
}

impl PublishReport {
    /// Both scopes added together.
    pub fn total(&self) -> BroadcastReport {
        self.global.merge(self.organization)
    }
}

/// Exclusive write-and-publish slot of one organization. Released on drop.
pub type OrganizationTurn = OwnedMutexGuard<()>;

#[derive(Clone)]
pub struct EventPublisher {
    engine: BroadcastEngine,
    turns: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl EventPublisher {
    pub fn new(engine: BroadcastEngine) -> Self {
        Self {
            engine,
            turns: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn engine(&self) -> &BroadcastEngine {
        &self.engine
    }

    /// Wait for `org_id`'s turn. Take it before the write; drop it after
    /// [`publish`](Self::publish).
    pub async fn begin(&self, org_id: &str) -> OrganizationTurn {
        let lock = {
            let mut turns = self.turns.lock().await;
            // entries nobody holds or waits on
            turns.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(turns.entry(org_id.to_owned()).or_default())
        };
        lock.lock_owned().await
    }

    /// Encode `mutation` and broadcast it. Returns `None` if it could not
    /// be encoded.
    pub async fn publish(&self, mutation: Mutation<'_>) -> Option<PublishReport> {
        match mutation.encode() {
            Ok(event) => match self.process(event).await {
                Ok(report) => Some(report),
                Err(never) => match never {},
            },
            Err(e) => {
                error!(org_id = mutation.org_id(), error = %e, "Failed to encode event");
                None
            }
        }
    }
}

impl Processor<DomainEvent> for EventPublisher {
    type Output = PublishReport;
    type Error = Infallible;

    async fn process(&self, event: DomainEvent) -> Result<PublishReport, Infallible> {
        let global = self
            .engine
            .broadcast_to_all(&event)
            .await
            .unwrap_or_else(|e| {
                error!(event_type = %event.kind(), error = %e, "Global broadcast failed");
                BroadcastReport::default()
            });
        let organization = self
            .engine
            .broadcast_to_organization(&event, event.org_id())
            .await
            .unwrap_or_else(|e| {
                error!(event_type = %event.kind(), error = %e, "Organization broadcast failed");
                BroadcastReport::default()
            });

        let report = PublishReport {
            global,
            organization,
        };
        let total = report.total();
        debug!(
            event_type = %event.kind(),
            org_id = event.org_id(),
            global_delivered = global.delivered,
            org_delivered = organization.delivered,
            attempted = total.attempted,
            reaped = total.reaped,
            "Published event"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, RealtimeConfig};
    use crate::entities::incident::IncidentRecord;
    use crate::entities::service::ServiceRecord;
    use crate::entities::{IncidentStatus, ServiceStatus};
    use crate::realtime::{ConnectionHandle, ConnectionRegistry};
    use spage_sdk::objects::{
        EventEnvelope, EventKind, EventPayload, ServiceStatus as SdkServiceStatus,
    };
    use sqlx::types::Json;
    use std::time::Duration;
    use time::macros::datetime;

    fn publisher() -> EventPublisher {
        EventPublisher::new(BroadcastEngine::new(
            ConnectionRegistry::new(),
            ConfigStore::new(RealtimeConfig::default()),
        ))
    }

    fn payment_gateway() -> ServiceRecord {
        ServiceRecord {
            id: 4,
            org_id: "acme".into(),
            name: "Payment Gateway".into(),
            description: "Card processing".into(),
            status: ServiceStatus::MajorOutage,
            uptime: "100.00%".into(),
            link: String::new(),
        }
    }

    #[tokio::test]
    async fn test_scoped_and_global_subscribers() {
        let publisher = publisher();
        let registry = publisher.engine().registry();
        let (a, mut rx_a) = ConnectionHandle::open(8);
        let (b, mut rx_b) = ConnectionHandle::open(8);
        registry.register(a, Some("acme")).await;
        registry.register(b, None).await;

        let service = payment_gateway();
        let report = publisher
            .publish(Mutation::ServiceUpdated {
                service: &service,
                previous_status: ServiceStatus::Operational,
            })
            .await
            .unwrap();
        assert_eq!(report.global.delivered, 2);
        assert_eq!(report.organization.delivered, 1);

        for _ in 0..2 {
            let frame = rx_a.recv().await.unwrap();
            let envelope: EventEnvelope = serde_json::from_str(&frame).unwrap();
            assert_eq!(envelope.kind(), EventKind::ServiceUpdated);
            assert_eq!(envelope.org_id, "acme");
        }
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.recv().await.is_some());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_other_org_subscriber_gets_global_copy_only() {
        let publisher = publisher();
        let (c, mut rx_c) = ConnectionHandle::open(8);
        publisher.engine().registry().register(c, Some("globex")).await;

        let service = payment_gateway();
        let report = publisher
            .publish(Mutation::ServiceCreated(&service))
            .await
            .unwrap();
        assert_eq!(report.organization, BroadcastReport::default());
        assert!(rx_c.recv().await.is_some());
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unencodable_mutation_is_dropped() {
        let publisher = publisher();
        let (a, mut rx_a) = ConnectionHandle::open(8);
        publisher.engine().registry().register(a, None).await;

        let incident = IncidentRecord {
            id: 9,
            org_id: "acme".into(),
            title: "Card declines".into(),
            status: IncidentStatus::Investigating,
            created_at: datetime!(2025-03-01 11:00 UTC),
            service_id: 4,
            updates: Json(Vec::new()),
        };
        assert!(
            publisher
                .publish(Mutation::IncidentUpdateAppended(&incident))
                .await
                .is_none()
        );
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_processor_accepts_encoded_events() {
        let publisher = publisher();
        let (a, mut rx_a) = ConnectionHandle::open(8);
        publisher.engine().registry().register(a, Some("acme")).await;

        let service = payment_gateway();
        let event = Mutation::ServiceDeleted(&service).encode().unwrap();
        let report = publisher.process(event).await.unwrap();
        assert_eq!(report.global.delivered + report.organization.delivered, 2);

        let frame = rx_a.recv().await.unwrap();
        let envelope: EventEnvelope = serde_json::from_str(&frame).unwrap();
        assert!(matches!(envelope.payload, EventPayload::ServiceDeleted(_)));
    }

    #[tokio::test]
    async fn test_same_org_writers_publish_in_commit_order() {
        let publisher = publisher();
        let (a, mut rx_a) = ConnectionHandle::open(8);
        publisher.engine().registry().register(a, None).await;

        // first writer holds the turn across its commit
        let first_turn = publisher.begin("acme").await;

        let racer = {
            let publisher = publisher.clone();
            tokio::spawn(async move {
                let _turn = publisher.begin("acme").await;
                let service = ServiceRecord {
                    status: ServiceStatus::MajorOutage,
                    ..payment_gateway()
                };
                publisher
                    .publish(Mutation::ServiceUpdated {
                        service: &service,
                        previous_status: ServiceStatus::DegradedPerformance,
                    })
                    .await;
            })
        };

        // the second writer must not get ahead while the first is between
        // commit and publish
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx_a.try_recv().is_err());

        let service = ServiceRecord {
            status: ServiceStatus::DegradedPerformance,
            ..payment_gateway()
        };
        publisher
            .publish(Mutation::ServiceUpdated {
                service: &service,
                previous_status: ServiceStatus::Operational,
            })
            .await
            .unwrap();
        drop(first_turn);
        racer.await.unwrap();

        let mut statuses = Vec::new();
        for _ in 0..2 {
            let frame = rx_a.recv().await.unwrap();
            let envelope: EventEnvelope = serde_json::from_str(&frame).unwrap();
            let EventPayload::ServiceUpdated(change) = envelope.payload else {
                unreachable!("expected service_updated");
            };
            statuses.push((change.previous_status, change.service.status));
        }
        assert_eq!(
            statuses,
            vec![
                (
                    SdkServiceStatus::Operational,
                    SdkServiceStatus::DegradedPerformance
                ),
                (
                    SdkServiceStatus::DegradedPerformance,
                    SdkServiceStatus::MajorOutage
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_other_orgs_do_not_wait() {
        let publisher = publisher();
        let _acme = publisher.begin("acme").await;
        let globex = publisher.begin("globex");
        assert!(
            tokio::time::timeout(Duration::from_millis(100), globex)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_released_turns_are_forgotten() {
        let publisher = publisher();
        drop(publisher.begin("acme").await);
        drop(publisher.begin("globex").await);
        let _initech = publisher.begin("initech").await;
        let turns = publisher.turns.lock().await;
        assert_eq!(turns.len(), 1);
        assert!(turns.contains_key("initech"));
    }

    #[test]
    fn test_publish_report_total() {
        let report = PublishReport {
            global: BroadcastReport {
                attempted: 3,
                delivered: 2,
                reaped: 1,
            },
            organization: BroadcastReport {
                attempted: 1,
                delivered: 1,
                reaped: 0,
            },
        };
        assert_eq!(
            report.total(),
            BroadcastReport {
                attempted: 4,
                delivered: 3,
                reaped: 1,
            }
        );
    }
}
