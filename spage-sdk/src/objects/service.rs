//! Service request and response types.

use serde::{Deserialize, Serialize};

/// Health state of a service.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `spage-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Operational,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Operational => "operational",
            ServiceStatus::DegradedPerformance => "degraded_performance",
            ServiceStatus::PartialOutage => "partial_outage",
            ServiceStatus::MajorOutage => "major_outage",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for `POST /services` and `PUT /services/{id}`.
///
/// `PUT` replaces every field, so both endpoints share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUpsert {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: ServiceStatus,
    /// Uptime percentage as displayed, e.g. `"99.95%"`. Defaults to
    /// [`ServiceUpsert::DEFAULT_UPTIME`].
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl ServiceUpsert {
    pub const DEFAULT_UPTIME: &'static str = "100.00%";

    pub fn uptime_or_default(&self) -> String {
        self.uptime
            .clone()
            .unwrap_or_else(|| Self::DEFAULT_UPTIME.to_owned())
    }

    pub fn link_or_default(&self) -> String {
        self.link.clone().unwrap_or_default()
    }
}

/// A service as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: i64,
    pub org_id: String,
    pub name: String,
    pub description: String,
    pub status: ServiceStatus,
    pub uptime: String,
    pub link: String,
}
