use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use spage_core::entities::incident::DeleteIncident;
use spage_core::events::Mutation;
use spage_sdk::objects::DeletionResponse;

use super::IncidentApiError;
use crate::api::extractors::OrgId;
use crate::state::AppState;

/// `DELETE /incidents/{incident_id}`: delete an incident.
pub(super) async fn delete_incident(
    state: State<AppState>,
    OrgId(org_id): OrgId,
    Path(incident_id): Path<i64>,
) -> Result<impl IntoResponse, IncidentApiError> {
    let _turn = state.events.begin(&org_id).await;
    let record = state
        .db
        .process(DeleteIncident {
            org_id,
            incident_id,
        })
        .await
        .map_err(IncidentApiError::Database)?
        .ok_or(IncidentApiError::NotFound)?;

    tracing::info!(org_id = %record.org_id, incident_id, "Incident deleted");
    state.events.publish(Mutation::IncidentDeleted(&record)).await;

    Ok(Json(deletion_response(&record.title)))
}

fn deletion_response(title: &str) -> DeletionResponse {
    DeletionResponse {
        message: format!("Incident '{title}' deleted successfully"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deletion_message_names_the_incident() {
        assert_eq!(
            deletion_response("Card declines").message,
            "Incident 'Card declines' deleted successfully"
        );
    }
}
