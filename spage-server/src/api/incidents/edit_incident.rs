use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use spage_core::entities::incident::{EditIncident, EditIncidentOutcome};
use spage_core::events::Mutation;
use spage_sdk::objects::IncidentEdit;

use super::{IncidentApiError, to_response};
use crate::api::extractors::OrgId;
use crate::api::require_text;
use crate::state::AppState;

/// `PUT /incidents/{incident_id}`: change the fields present in the body.
///
/// A new `serviceId` must name a service of the same organization.
/// Publishes `incident_updated` carrying the status the incident had before.
pub(super) async fn edit_incident(
    state: State<AppState>,
    OrgId(org_id): OrgId,
    Path(incident_id): Path<i64>,
    Json(body): Json<IncidentEdit>,
) -> Result<impl IntoResponse, IncidentApiError> {
    if let Some(title) = &body.title {
        require_text(title, "title").map_err(IncidentApiError::Validation)?;
    }

    let _turn = state.events.begin(&org_id).await;
    let outcome = state
        .db
        .process(EditIncident {
            org_id,
            incident_id,
            title: body.title,
            status: body.status.map(Into::into),
            service_id: body.service_id,
            updates: body.updates,
        })
        .await
        .map_err(IncidentApiError::Database)?;

    let (previous_status, record) = match outcome {
        EditIncidentOutcome::NotFound => return Err(IncidentApiError::NotFound),
        EditIncidentOutcome::ServiceNotFound => return Err(IncidentApiError::ServiceNotFound),
        EditIncidentOutcome::Edited {
            previous_status,
            incident,
        } => (previous_status, incident),
    };

    tracing::info!(
        org_id = %record.org_id,
        incident_id,
        previous_status = ?previous_status,
        status = ?record.status,
        "Incident updated"
    );
    state
        .events
        .publish(Mutation::IncidentUpdated {
            incident: &record,
            previous_status,
        })
        .await;

    Ok(Json(to_response(&record)))
}
