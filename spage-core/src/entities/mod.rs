pub mod incident;
pub mod service;

use spage_sdk::objects::{IncidentStatus as SdkIncidentStatus, ServiceStatus as SdkServiceStatus};

/// Service health state for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `spage_sdk::objects::ServiceStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "service_status")]
pub enum ServiceStatus {
    Operational,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
}

impl From<ServiceStatus> for SdkServiceStatus {
    fn from(value: ServiceStatus) -> Self {
        match value {
            ServiceStatus::Operational => SdkServiceStatus::Operational,
            ServiceStatus::DegradedPerformance => SdkServiceStatus::DegradedPerformance,
            ServiceStatus::PartialOutage => SdkServiceStatus::PartialOutage,
            ServiceStatus::MajorOutage => SdkServiceStatus::MajorOutage,
        }
    }
}

impl From<SdkServiceStatus> for ServiceStatus {
    fn from(value: SdkServiceStatus) -> Self {
        match value {
            SdkServiceStatus::Operational => ServiceStatus::Operational,
            SdkServiceStatus::DegradedPerformance => ServiceStatus::DegradedPerformance,
            SdkServiceStatus::PartialOutage => ServiceStatus::PartialOutage,
            SdkServiceStatus::MajorOutage => ServiceStatus::MajorOutage,
        }
    }
}

/// Incident lifecycle state for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `spage_sdk::objects::IncidentStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "snake_case", type_name = "incident_status")]
pub enum IncidentStatus {
    Investigating,
    Identified,
    Monitoring,
    Resolved,
}

impl From<IncidentStatus> for SdkIncidentStatus {
    fn from(value: IncidentStatus) -> Self {
        match value {
            IncidentStatus::Investigating => SdkIncidentStatus::Investigating,
            IncidentStatus::Identified => SdkIncidentStatus::Identified,
            IncidentStatus::Monitoring => SdkIncidentStatus::Monitoring,
            IncidentStatus::Resolved => SdkIncidentStatus::Resolved,
        }
    }
}

impl From<SdkIncidentStatus> for IncidentStatus {
    fn from(value: SdkIncidentStatus) -> Self {
        match value {
            SdkIncidentStatus::Investigating => IncidentStatus::Investigating,
            SdkIncidentStatus::Identified => IncidentStatus::Identified,
            SdkIncidentStatus::Monitoring => IncidentStatus::Monitoring,
            SdkIncidentStatus::Resolved => IncidentStatus::Resolved,
        }
    }
}
