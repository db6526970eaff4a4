use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use spage_core::entities::incident::AppendIncidentUpdate;
use spage_core::events::Mutation;
use spage_sdk::objects::NewIncidentUpdate;

use super::{IncidentApiError, to_response};
use crate::api::extractors::OrgId;
use crate::api::require_text;
use crate::state::AppState;

/// `POST /incidents/{incident_id}/updates`: append one entry to the
/// update trail.
///
/// The incident's own status is left as it is. Publishes
/// `incident_update_appended` with the new entry and the full trail.
pub(super) async fn append_update(
    state: State<AppState>,
    OrgId(org_id): OrgId,
    Path(incident_id): Path<i64>,
    Json(body): Json<NewIncidentUpdate>,
) -> Result<impl IntoResponse, IncidentApiError> {
    require_text(&body.message, "message").map_err(IncidentApiError::Validation)?;

    let _turn = state.events.begin(&org_id).await;
    let append = AppendIncidentUpdate::from_request(
        org_id,
        incident_id,
        body,
        time::OffsetDateTime::now_utc(),
    );
    let record = state
        .db
        .process(append)
        .await
        .map_err(IncidentApiError::Database)?
        .ok_or(IncidentApiError::NotFound)?;

    tracing::info!(
        org_id = %record.org_id,
        incident_id,
        updates = record.updates.0.len(),
        "Incident update appended"
    );
    state
        .events
        .publish(Mutation::IncidentUpdateAppended(&record))
        .await;

    Ok(Json(to_response(&record)))
}
