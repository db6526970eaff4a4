use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use spage_core::entities::service::UpdateService;
use spage_core::events::Mutation;
use spage_sdk::objects::ServiceUpsert;

use super::{ServiceApiError, to_response, validate};
use crate::api::extractors::OrgId;
use crate::state::AppState;

/// `PUT /services/{service_id}`: replace every field of a service.
///
/// Publishes `service_updated` carrying the status the service had before.
pub(super) async fn update_service(
    state: State<AppState>,
    OrgId(org_id): OrgId,
    Path(service_id): Path<i64>,
    Json(body): Json<ServiceUpsert>,
) -> Result<impl IntoResponse, ServiceApiError> {
    validate(&body)?;

    let _turn = state.events.begin(&org_id).await;
    let updated = state
        .db
        .process(UpdateService {
            org_id,
            service_id,
            uptime: body.uptime_or_default(),
            link: body.link_or_default(),
            name: body.name,
            description: body.description,
            status: body.status.into(),
        })
        .await
        .map_err(ServiceApiError::Database)?
        .ok_or(ServiceApiError::NotFound)?;

    tracing::info!(
        org_id = %updated.service.org_id,
        service_id,
        previous_status = ?updated.previous_status,
        status = ?updated.service.status,
        "Service updated"
    );
    state
        .events
        .publish(Mutation::ServiceUpdated {
            service: &updated.service,
            previous_status: updated.previous_status,
        })
        .await;

    Ok(Json(to_response(&updated.service)))
}
