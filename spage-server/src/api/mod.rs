//! HTTP and WebSocket API.
//!
//! # Endpoints
//!
//! - `/services`, `/services/{service_id}`       – service CRUD
//! - `/incidents`, `/incidents/{incident_id}`    – incident CRUD
//! - `/incidents/{incident_id}/updates`          – append to an update trail
//! - `/organizations/{org_id}`                   – organization display name
//! - `/ws`, `/ws/{org_id}`                       – live event stream
//!
//! REST routes other than `/organizations` require the `X-Org-ID` header.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::state::AppState;

pub mod extractors;
pub mod incidents;
pub mod organizations;
pub mod services;
pub mod ws;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(services::router())
        .merge(incidents::router())
        .merge(organizations::router())
        .merge(ws::router())
}

/// JSON error body, `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub detail: &'a str,
}

pub(crate) fn error_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(ErrorBody { detail })).into_response()
}

/// Reject empty or whitespace-only text fields.
pub(crate) fn require_text(value: &str, field: &'static str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err(field)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("Payment Gateway", "name"), Ok(()));
        assert_eq!(require_text("  \t", "name"), Err("name"));
        assert_eq!(require_text("", "title"), Err("title"));
    }
}
