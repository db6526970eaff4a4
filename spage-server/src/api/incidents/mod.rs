//! Incident API handlers.
//!
//! # Endpoints
//!
//! - `GET    /incidents`                       – list the organization's incidents
//! - `POST   /incidents`                       – open an incident against a service
//! - `GET    /incidents/{incident_id}`         – get one incident
//! - `PUT    /incidents/{incident_id}`         – change some fields of an incident
//! - `DELETE /incidents/{incident_id}`         – delete an incident
//! - `POST   /incidents/{incident_id}/updates` – append to the update trail
//!
//! Mutations hold the organization's publish turn across write and publish.

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use spage_core::entities::incident::IncidentRecord;
use spage_sdk::objects::IncidentResponse;

use crate::api::error_response;
use crate::state::AppState;

mod append_update;
mod create_incident;
mod delete_incident;
mod edit_incident;
mod get_incident;
mod list_incidents;

/// Build the Incident API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/incidents",
            get(list_incidents::list_incidents).post(create_incident::create_incident),
        )
        .route(
            "/incidents/{incident_id}",
            get(get_incident::get_incident)
                .put(edit_incident::edit_incident)
                .delete(delete_incident::delete_incident),
        )
        .route(
            "/incidents/{incident_id}/updates",
            post(append_update::append_update),
        )
}

/// Convert an `IncidentRecord` (DB model) into an `IncidentResponse` (API model).
fn to_response(record: &IncidentRecord) -> IncidentResponse {
    IncidentResponse {
        id: record.id,
        org_id: record.org_id.clone(),
        title: record.title.clone(),
        status: record.status.into(),
        created_at: record.created_at,
        service_id: record.service_id,
        updates: record.updates.0.clone(),
    }
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Incident API handlers.
#[derive(Debug)]
enum IncidentApiError {
    /// A database query failed.
    Database(sqlx::Error),
    /// The incident does not exist in the caller's organization.
    NotFound,
    /// The referenced service does not exist in the caller's organization.
    ServiceNotFound,
    /// A required text field was blank.
    Validation(&'static str),
}

impl IntoResponse for IncidentApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            IncidentApiError::Database(e) => {
                tracing::error!(error = %e, "Incident API database error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            IncidentApiError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "Incident not found")
            }
            IncidentApiError::ServiceNotFound => {
                error_response(StatusCode::NOT_FOUND, "Service not found")
            }
            IncidentApiError::Validation(field) => {
                error_response(StatusCode::BAD_REQUEST, &format!("{field} must not be empty"))
            }
        }
    }
}
