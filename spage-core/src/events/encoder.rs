//! Mutation → notification encoding.
//!
//! Encoding is pure: it reads the post-mutation record (plus the status it
//! replaced, for updates) and never touches the database or the registry.

use std::sync::Arc;

use spage_sdk::objects::{
    EventEnvelope, EventKind, EventPayload, IncidentChange, IncidentRemoval, IncidentSnapshot,
    IncidentUpdateAppended, ServiceChange, ServiceRemoval, ServiceSnapshot,
};
use thiserror::Error;
use time::OffsetDateTime;

use crate::entities::incident::IncidentRecord;
use crate::entities::service::ServiceRecord;
use crate::entities::{IncidentStatus, ServiceStatus};

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event is missing required field `{0}`")]
    MissingField(&'static str),

    /// An append event must carry the entry that was appended.
    #[error("incident {incident_id} has an empty update trail")]
    EmptyUpdateTrail { incident_id: i64 },

    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A committed change, described by the state it left behind.
#[derive(Debug, Clone, Copy)]
pub enum Mutation<'a> {
    ServiceCreated(&'a ServiceRecord),
    ServiceUpdated {
        service: &'a ServiceRecord,
        previous_status: ServiceStatus,
    },
    ServiceDeleted(&'a ServiceRecord),
    IncidentCreated(&'a IncidentRecord),
    IncidentUpdated {
        incident: &'a IncidentRecord,
        previous_status: IncidentStatus,
    },
    IncidentDeleted(&'a IncidentRecord),
    /// The record already contains the new entry as the last element.
    IncidentUpdateAppended(&'a IncidentRecord),
}

impl Mutation<'_> {
    pub fn org_id(&self) -> &str {
        match self {
            Mutation::ServiceCreated(service)
            | Mutation::ServiceUpdated { service, .. }
            | Mutation::ServiceDeleted(service) => &service.org_id,
            Mutation::IncidentCreated(incident)
            | Mutation::IncidentUpdated { incident, .. }
            | Mutation::IncidentDeleted(incident)
            | Mutation::IncidentUpdateAppended(incident) => &incident.org_id,
        }
    }

    pub fn encode(&self) -> Result<DomainEvent, EventError> {
        self.encode_at(OffsetDateTime::now_utc())
    }

    /// Encode with an explicit creation timestamp.
    pub fn encode_at(&self, timestamp: OffsetDateTime) -> Result<DomainEvent, EventError> {
        let org_id = self.org_id();
        if org_id.is_empty() {
            return Err(EventError::MissingField("orgId"));
        }

        let payload = match *self {
            Mutation::ServiceCreated(service) => {
                EventPayload::ServiceCreated(service_snapshot(service))
            }
            Mutation::ServiceUpdated {
                service,
                previous_status,
            } => EventPayload::ServiceUpdated(ServiceChange {
                service: service_snapshot(service),
                previous_status: previous_status.into(),
            }),
            Mutation::ServiceDeleted(service) => EventPayload::ServiceDeleted(ServiceRemoval {
                id: service.id,
                name: service.name.clone(),
            }),
            Mutation::IncidentCreated(incident) => {
                EventPayload::IncidentCreated(incident_snapshot(incident))
            }
            Mutation::IncidentUpdated {
                incident,
                previous_status,
            } => EventPayload::IncidentUpdated(IncidentChange {
                incident: incident_snapshot(incident),
                previous_status: previous_status.into(),
            }),
            Mutation::IncidentDeleted(incident) => {
                EventPayload::IncidentDeleted(IncidentRemoval {
                    id: incident.id,
                    title: incident.title.clone(),
                    service_id: incident.service_id,
                })
            }
            Mutation::IncidentUpdateAppended(incident) => {
                let new_update = incident.updates.0.last().cloned().ok_or(
                    EventError::EmptyUpdateTrail {
                        incident_id: incident.id,
                    },
                )?;
                EventPayload::IncidentUpdateAppended(IncidentUpdateAppended {
                    id: incident.id,
                    title: incident.title.clone(),
                    status: incident.status.into(),
                    service_id: incident.service_id,
                    new_update,
                    all_updates: incident.updates.0.clone(),
                })
            }
        };

        Ok(DomainEvent {
            envelope: EventEnvelope {
                org_id: org_id.to_owned(),
                payload,
                timestamp,
            },
        })
    }
}

fn service_snapshot(service: &ServiceRecord) -> ServiceSnapshot {
    ServiceSnapshot {
        id: service.id,
        name: service.name.clone(),
        description: service.description.clone(),
        status: service.status.into(),
        uptime: service.uptime.clone(),
        link: service.link.clone(),
    }
}

fn incident_snapshot(incident: &IncidentRecord) -> IncidentSnapshot {
    IncidentSnapshot {
        id: incident.id,
        title: incident.title.clone(),
        status: incident.status.into(),
        created_at: incident.created_at,
        service_id: incident.service_id,
        updates: incident.updates.0.clone(),
    }
}

/// An encoded, immutable notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEvent {
    envelope: EventEnvelope,
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        self.envelope.kind()
    }

    pub fn org_id(&self) -> &str {
        &self.envelope.org_id
    }

    pub fn payload(&self) -> &EventPayload {
        &self.envelope.payload
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.envelope.timestamp
    }

    pub fn envelope(&self) -> &EventEnvelope {
        &self.envelope
    }

    /// The text frame sent to subscribers.
    pub fn to_json(&self) -> Result<Arc<str>, EventError> {
        Ok(Arc::from(serde_json::to_string(&self.envelope)?))
    }
}
