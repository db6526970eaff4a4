//! Live event payloads pushed over the WebSocket stream.
//!
//! Every committed mutation produces exactly one [`EventEnvelope`]:
//!
//! ```json
//! {"type":"service_updated","orgId":"acme","data":{ ... },"timestamp":"2025-03-01T12:00:00Z"}
//! ```
//!
//! The shape of `data` is selected by `type`; see [`EventPayload`].

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::incident::{IncidentStatus, IncidentUpdateEntry};
use super::service::ServiceStatus;

/// Discriminant of an event, serialized as the envelope's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ServiceCreated,
    ServiceUpdated,
    ServiceDeleted,
    IncidentCreated,
    IncidentUpdated,
    IncidentDeleted,
    IncidentUpdateAppended,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ServiceCreated => "service_created",
            EventKind::ServiceUpdated => "service_updated",
            EventKind::ServiceDeleted => "service_deleted",
            EventKind::IncidentCreated => "incident_created",
            EventKind::IncidentUpdated => "incident_updated",
            EventKind::IncidentDeleted => "incident_deleted",
            EventKind::IncidentUpdateAppended => "incident_update_appended",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `data` of `service_created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status: ServiceStatus,
    pub uptime: String,
    pub link: String,
}

/// `data` of `service_updated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceChange {
    #[serde(flatten)]
    pub service: ServiceSnapshot,
    pub previous_status: ServiceStatus,
}

/// `data` of `service_deleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRemoval {
    pub id: i64,
    pub name: String,
}

/// `data` of `incident_created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSnapshot {
    pub id: i64,
    pub title: String,
    pub status: IncidentStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub service_id: i64,
    pub updates: Vec<IncidentUpdateEntry>,
}

/// `data` of `incident_updated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentChange {
    #[serde(flatten)]
    pub incident: IncidentSnapshot,
    pub previous_status: IncidentStatus,
}

/// `data` of `incident_deleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRemoval {
    pub id: i64,
    pub title: String,
    pub service_id: i64,
}

/// `data` of `incident_update_appended`.
///
/// `all_updates` is the full trail after the append; its last element is
/// always `new_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentUpdateAppended {
    pub id: i64,
    pub title: String,
    pub status: IncidentStatus,
    pub service_id: i64,
    pub new_update: IncidentUpdateEntry,
    pub all_updates: Vec<IncidentUpdateEntry>,
}

/// Kind-specific event body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    ServiceCreated(ServiceSnapshot),
    ServiceUpdated(ServiceChange),
    ServiceDeleted(ServiceRemoval),
    IncidentCreated(IncidentSnapshot),
    IncidentUpdated(IncidentChange),
    IncidentDeleted(IncidentRemoval),
    IncidentUpdateAppended(IncidentUpdateAppended),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::ServiceCreated(_) => EventKind::ServiceCreated,
            EventPayload::ServiceUpdated(_) => EventKind::ServiceUpdated,
            EventPayload::ServiceDeleted(_) => EventKind::ServiceDeleted,
            EventPayload::IncidentCreated(_) => EventKind::IncidentCreated,
            EventPayload::IncidentUpdated(_) => EventKind::IncidentUpdated,
            EventPayload::IncidentDeleted(_) => EventKind::IncidentDeleted,
            EventPayload::IncidentUpdateAppended(_) => EventKind::IncidentUpdateAppended,
        }
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            EventPayload::ServiceCreated(data) => serde_json::to_value(data),
            EventPayload::ServiceUpdated(data) => serde_json::to_value(data),
            EventPayload::ServiceDeleted(data) => serde_json::to_value(data),
            EventPayload::IncidentCreated(data) => serde_json::to_value(data),
            EventPayload::IncidentUpdated(data) => serde_json::to_value(data),
            EventPayload::IncidentDeleted(data) => serde_json::to_value(data),
            EventPayload::IncidentUpdateAppended(data) => serde_json::to_value(data),
        }
    }

    fn from_value(kind: EventKind, data: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EventKind::ServiceCreated => EventPayload::ServiceCreated(serde_json::from_value(data)?),
            EventKind::ServiceUpdated => EventPayload::ServiceUpdated(serde_json::from_value(data)?),
            EventKind::ServiceDeleted => EventPayload::ServiceDeleted(serde_json::from_value(data)?),
            EventKind::IncidentCreated => {
                EventPayload::IncidentCreated(serde_json::from_value(data)?)
            }
            EventKind::IncidentUpdated => {
                EventPayload::IncidentUpdated(serde_json::from_value(data)?)
            }
            EventKind::IncidentDeleted => {
                EventPayload::IncidentDeleted(serde_json::from_value(data)?)
            }
            EventKind::IncidentUpdateAppended => {
                EventPayload::IncidentUpdateAppended(serde_json::from_value(data)?)
            }
        })
    }
}

/// One notification as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEnvelope {
    pub org_id: String,
    pub payload: EventPayload,
    pub timestamp: OffsetDateTime,
}

impl EventEnvelope {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// The literal wire layout; `data` is resolved against `type` on the way in.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: EventKind,
    org_id: String,
    data: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
}

impl Serialize for EventEnvelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let data = self.payload.to_value().map_err(serde::ser::Error::custom)?;
        RawEnvelope {
            kind: self.kind(),
            org_id: self.org_id.clone(),
            data,
            timestamp: self.timestamp,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EventEnvelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawEnvelope::deserialize(deserializer)?;
        let payload =
            EventPayload::from_value(raw.kind, raw.data).map_err(serde::de::Error::custom)?;
        Ok(EventEnvelope {
            org_id: raw.org_id,
            payload,
            timestamp: raw.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_service() -> ServiceSnapshot {
        ServiceSnapshot {
            id: 4,
            name: "Payment Gateway".into(),
            description: "Card processing".into(),
            status: ServiceStatus::MajorOutage,
            uptime: "99.10%".into(),
            link: "https://pay.example.com".into(),
        }
    }

    #[test]
    fn test_service_updated_wire_shape() {
        let envelope = EventEnvelope {
            org_id: "acme".into(),
            payload: EventPayload::ServiceUpdated(ServiceChange {
                service: sample_service(),
                previous_status: ServiceStatus::Operational,
            }),
            timestamp: datetime!(2025-03-01 12:00 UTC),
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "service_updated");
        assert_eq!(json["orgId"], "acme");
        assert_eq!(json["timestamp"], "2025-03-01T12:00:00Z");
        assert_eq!(json["data"]["status"], "major_outage");
        assert_eq!(json["data"]["previousStatus"], "operational");
        assert_eq!(json["data"]["uptime"], "99.10%");

        let back: EventEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_incident_deleted_carries_only_identity() {
        let envelope = EventEnvelope {
            org_id: "acme".into(),
            payload: EventPayload::IncidentDeleted(IncidentRemoval {
                id: 9,
                title: "Slow search".into(),
                service_id: 4,
            }),
            timestamp: datetime!(2025-03-01 12:00 UTC),
        };

        let json = serde_json::to_value(&envelope).unwrap();
        let data = json["data"].as_object().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data["serviceId"], 4);
    }

    #[test]
    fn test_data_must_match_type() {
        let json = r#"{
            "type": "incident_created",
            "orgId": "acme",
            "data": {"id": 1, "name": "Payment Gateway"},
            "timestamp": "2025-03-01T12:00:00Z"
        }"#;
        assert!(serde_json::from_str::<EventEnvelope>(json).is_err());
    }
}
