use axum::{Json, extract::State, response::IntoResponse};
use kanau::processor::Processor;
use spage_core::entities::service::ListServices;
use spage_sdk::objects::ServiceResponse;

use super::{ServiceApiError, to_response};
use crate::api::extractors::OrgId;
use crate::state::AppState;

/// `GET /services`: list the organization's services, oldest first.
pub(super) async fn list_services(
    state: State<AppState>,
    OrgId(org_id): OrgId,
) -> Result<impl IntoResponse, ServiceApiError> {
    let records = state
        .db
        .process(ListServices { org_id })
        .await
        .map_err(ServiceApiError::Database)?;

    let services: Vec<ServiceResponse> = records.iter().map(to_response).collect();
    Ok(Json(services))
}
