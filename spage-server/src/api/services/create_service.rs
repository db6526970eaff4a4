use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use kanau::processor::Processor;
use spage_core::entities::service::CreateService;
use spage_core::events::Mutation;
use spage_sdk::objects::ServiceUpsert;

use super::{ServiceApiError, to_response, validate};
use crate::api::extractors::OrgId;
use crate::state::AppState;

/// `POST /services`: create a service.
///
/// Publishes `service_created` once the row is committed.
pub(super) async fn create_service(
    state: State<AppState>,
    OrgId(org_id): OrgId,
    Json(body): Json<ServiceUpsert>,
) -> Result<impl IntoResponse, ServiceApiError> {
    validate(&body)?;

    let _turn = state.events.begin(&org_id).await;
    let record = state
        .db
        .process(CreateService {
            org_id,
            uptime: body.uptime_or_default(),
            link: body.link_or_default(),
            name: body.name,
            description: body.description,
            status: body.status.into(),
        })
        .await
        .map_err(ServiceApiError::Database)?;

    tracing::info!(org_id = %record.org_id, service_id = record.id, "Service created");
    state.events.publish(Mutation::ServiceCreated(&record)).await;

    Ok((StatusCode::CREATED, Json(to_response(&record))))
}
