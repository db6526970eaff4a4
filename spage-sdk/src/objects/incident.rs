//! Incident request and response types.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an incident and of each entry in its update trail.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `spage-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Investigating,
    Identified,
    Monitoring,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Identified => "identified",
            IncidentStatus::Monitoring => "monitoring",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an incident's append-only update trail.
///
/// `timestamp` is kept as the caller sent it; entries appended through
/// `POST /incidents/{id}/updates` without a timestamp get an RFC 3339 one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdateEntry {
    pub message: String,
    pub status: IncidentStatus,
    pub timestamp: String,
}

/// Request body for `POST /incidents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentCreate {
    pub title: String,
    pub status: IncidentStatus,
    pub service_id: i64,
    #[serde(default)]
    pub updates: Vec<IncidentUpdateEntry>,
}

/// Request body for `PUT /incidents/{id}`.
///
/// Only the fields that are present are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates: Option<Vec<IncidentUpdateEntry>>,
}

/// Request body for `POST /incidents/{id}/updates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIncidentUpdate {
    pub message: String,
    pub status: IncidentStatus,
    /// Empty or missing means "now".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// An incident as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentResponse {
    pub id: i64,
    pub org_id: String,
    pub title: String,
    pub status: IncidentStatus,
    /// RFC 3339 creation time. Kept as `created_at` on the wire for
    /// compatibility with existing dashboards.
    #[serde(rename = "created_at", with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    pub service_id: i64,
    pub updates: Vec<IncidentUpdateEntry>,
}
