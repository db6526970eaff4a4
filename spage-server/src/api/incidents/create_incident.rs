use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use spage_core::entities::incident::CreateIncident;
use spage_core::events::Mutation;
use spage_sdk::objects::IncidentCreate;

use super::{IncidentApiError, to_response};
use crate::api::extractors::OrgId;
use crate::api::require_text;
use crate::state::AppState;

/// `POST /incidents`: open an incident against one of the organization's
/// services.
///
/// Publishes `incident_created` once the row is committed.
pub(super) async fn create_incident(
    state: State<AppState>,
    OrgId(org_id): OrgId,
    Json(body): Json<IncidentCreate>,
) -> Result<impl IntoResponse, IncidentApiError> {
    require_text(&body.title, "title").map_err(IncidentApiError::Validation)?;

    let _turn = state.events.begin(&org_id).await;
    let record = state
        .db
        .process(CreateIncident {
            org_id,
            title: body.title,
            status: body.status.into(),
            service_id: body.service_id,
            updates: body.updates,
        })
        .await
        .map_err(IncidentApiError::Database)?
        .ok_or(IncidentApiError::ServiceNotFound)?;

    tracing::info!(
        org_id = %record.org_id,
        incident_id = record.id,
        service_id = record.service_id,
        "Incident created"
    );
    state.events.publish(Mutation::IncidentCreated(&record)).await;

    Ok((StatusCode::CREATED, Json(to_response(&record))))
}
