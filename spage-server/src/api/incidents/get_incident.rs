use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use spage_core::entities::incident::GetIncidentById;

use super::{IncidentApiError, to_response};
use crate::api::extractors::OrgId;
use crate::state::AppState;

/// `GET /incidents/{incident_id}`: get one incident.
pub(super) async fn get_incident(
    state: State<AppState>,
    OrgId(org_id): OrgId,
    Path(incident_id): Path<i64>,
) -> Result<impl IntoResponse, IncidentApiError> {
    let record = state
        .db
        .process(GetIncidentById {
            org_id,
            incident_id,
        })
        .await
        .map_err(IncidentApiError::Database)?
        .ok_or(IncidentApiError::NotFound)?;

    Ok(Json(to_response(&record)))
}
