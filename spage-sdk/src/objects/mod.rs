pub mod events;
pub mod incident;
pub mod organization;
pub mod service;
pub mod ws;

pub use events::{
    EventEnvelope, EventKind, EventPayload, IncidentChange, IncidentRemoval, IncidentSnapshot,
    IncidentUpdateAppended, ServiceChange, ServiceRemoval, ServiceSnapshot,
};
pub use incident::{
    IncidentCreate, IncidentEdit, IncidentResponse, IncidentStatus, IncidentUpdateEntry,
    NewIncidentUpdate,
};
pub use organization::OrganizationResponse;
pub use service::{ServiceResponse, ServiceStatus, ServiceUpsert};
pub use ws::{GLOBAL_SUBSCRIPTION_PATH, WsCloseCode, subscription_path};

/// Header carrying the caller-supplied organization identifier.
///
/// Every organization-scoped REST endpoint requires it. The value is not
/// verified against any directory; it is only used as a tenant key.
pub const ORG_ID_HEADER: &str = "X-Org-ID";

/// Format a UTC timestamp the way every payload in this crate does.
///
/// Falls back to the Unix epoch seconds if RFC 3339 formatting fails, which
/// only happens for years outside `0..=9999`.
pub fn format_timestamp(at: time::OffsetDateTime) -> String {
    at.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Response body of the `DELETE` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeletionResponse {
    pub message: String,
}
