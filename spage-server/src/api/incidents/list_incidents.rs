use axum::{Json, extract::State, response::IntoResponse};
use kanau::processor::Processor;
use spage_core::entities::incident::ListIncidents;
use spage_sdk::objects::IncidentResponse;

use super::{IncidentApiError, to_response};
use crate::api::extractors::OrgId;
use crate::state::AppState;

/// `GET /incidents`: list the organization's incidents, oldest first.
pub(super) async fn list_incidents(
    state: State<AppState>,
    OrgId(org_id): OrgId,
) -> Result<impl IntoResponse, IncidentApiError> {
    let records = state
        .db
        .process(ListIncidents { org_id })
        .await
        .map_err(IncidentApiError::Database)?;

    let incidents: Vec<IncidentResponse> = records.iter().map(to_response).collect();
    Ok(Json(incidents))
}
