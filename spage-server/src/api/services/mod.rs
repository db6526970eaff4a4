//! Service API handlers.
//!
//! # Endpoints
//!
//! - `GET    /services`              – list the organization's services
//! - `POST   /services`              – create a service
//! - `GET    /services/{service_id}` – get one service
//! - `PUT    /services/{service_id}` – replace a service
//! - `DELETE /services/{service_id}` – delete a service and its incidents
//!
//! Every mutation holds its organization's publish turn from before the
//! write until its event is published, so events go out in commit order.

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use spage_core::entities::service::ServiceRecord;
use spage_sdk::objects::{ServiceResponse, ServiceUpsert};

use crate::api::{error_response, require_text};
use crate::state::AppState;

mod create_service;
mod delete_service;
mod get_service;
mod list_services;
mod update_service;

/// Build the Service API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/services",
            get(list_services::list_services).post(create_service::create_service),
        )
        .route(
            "/services/{service_id}",
            get(get_service::get_service)
                .put(update_service::update_service)
                .delete(delete_service::delete_service),
        )
}

/// Convert a `ServiceRecord` (DB model) into a `ServiceResponse` (API model).
fn to_response(record: &ServiceRecord) -> ServiceResponse {
    ServiceResponse {
        id: record.id,
        org_id: record.org_id.clone(),
        name: record.name.clone(),
        description: record.description.clone(),
        status: record.status.into(),
        uptime: record.uptime.clone(),
        link: record.link.clone(),
    }
}

fn validate(body: &ServiceUpsert) -> Result<(), ServiceApiError> {
    require_text(&body.name, "name").map_err(ServiceApiError::Validation)
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Service API handlers.
#[derive(Debug)]
enum ServiceApiError {
    /// A database query failed.
    Database(sqlx::Error),
    /// The service does not exist in the caller's organization.
    NotFound,
    /// A required text field was blank.
    Validation(&'static str),
}

impl IntoResponse for ServiceApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ServiceApiError::Database(e) => {
                tracing::error!(error = %e, "Service API database error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            ServiceApiError::NotFound => error_response(StatusCode::NOT_FOUND, "Service not found"),
            ServiceApiError::Validation(field) => {
                error_response(StatusCode::BAD_REQUEST, &format!("{field} must not be empty"))
            }
        }
    }
}
