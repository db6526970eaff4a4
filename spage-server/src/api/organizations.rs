//! Organization API handlers.
//!
//! # Endpoints
//!
//! - `GET /organizations/{org_id}` – resolve an organization's display name

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use kanau::processor::Processor;
use spage_core::processors::{DirectoryError, GetOrganizationName};
use spage_sdk::objects::OrganizationResponse;

use crate::api::error_response;
use crate::state::AppState;

/// Build the Organization API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/organizations/{org_id}", get(get_organization))
}

/// `GET /organizations/{org_id}`: look the organization up in the
/// directory. Any lookup failure is reported as not found.
async fn get_organization(
    state: State<AppState>,
    Path(org_id): Path<String>,
) -> Result<impl IntoResponse, OrganizationApiError> {
    let name = state
        .directory
        .process(GetOrganizationName {
            org_id: org_id.clone(),
        })
        .await
        .map_err(OrganizationApiError::Lookup)?;

    Ok(Json(OrganizationResponse { id: org_id, name }))
}

/// Errors that can occur in Organization API handlers.
#[derive(Debug)]
enum OrganizationApiError {
    Lookup(DirectoryError),
}

impl IntoResponse for OrganizationApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            OrganizationApiError::Lookup(e) => {
                tracing::warn!(error = %e, "Organization lookup failed");
                error_response(StatusCode::NOT_FOUND, "Organization not found")
            }
        }
    }
}
