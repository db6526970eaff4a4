use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use spage_core::entities::service::DeleteService;
use spage_core::events::Mutation;
use spage_sdk::objects::DeletionResponse;

use super::ServiceApiError;
use crate::api::extractors::OrgId;
use crate::state::AppState;

/// `DELETE /services/{service_id}`: delete a service and its incidents.
///
/// Publishes a single `service_deleted`; the removed incidents get no
/// events of their own.
pub(super) async fn delete_service(
    state: State<AppState>,
    OrgId(org_id): OrgId,
    Path(service_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let _turn = state.events.begin(&org_id).await;
    let deleted = state
        .db
        .process(DeleteService { org_id, service_id })
        .await
        .map_err(ServiceApiError::Database)?
        .ok_or(ServiceApiError::NotFound)?;

    tracing::info!(
        org_id = %deleted.service.org_id,
        service_id,
        incidents_removed = deleted.incidents_removed,
        "Service deleted"
    );
    state
        .events
        .publish(Mutation::ServiceDeleted(&deleted.service))
        .await;

    Ok(Json(deletion_response(&deleted.service.name)))
}

fn deletion_response(name: &str) -> DeletionResponse {
    DeletionResponse {
        message: format!("Service '{name}' and all associated incidents deleted successfully"),
    }
}
