use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use spage_core::entities::service::GetServiceById;

use super::{ServiceApiError, to_response};
use crate::api::extractors::OrgId;
use crate::state::AppState;

/// `GET /services/{service_id}`: get one service.
pub(super) async fn get_service(
    state: State<AppState>,
    OrgId(org_id): OrgId,
    Path(service_id): Path<i64>,
) -> Result<impl IntoResponse, ServiceApiError> {
    let record = state
        .db
        .process(GetServiceById { org_id, service_id })
        .await
        .map_err(ServiceApiError::Database)?
        .ok_or(ServiceApiError::NotFound)?;

    Ok(Json(to_response(&record)))
}
