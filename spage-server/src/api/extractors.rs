//! Custom Axum extractors for request scoping.
//!
//! Provides `OrgId`, the tenant key read from the `X-Org-ID` header. The
//! value is trusted as given; it only selects which organization's rows a
//! request can see or change.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use spage_sdk::objects::ORG_ID_HEADER;

use super::error_response;

/// The caller-supplied organization identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgId(pub String);

/// Errors returned by the [`OrgId`] extractor.
#[derive(Debug, PartialEq, Eq)]
pub enum OrgIdError {
    Missing,
    InvalidHeader,
}

impl IntoResponse for OrgIdError {
    fn into_response(self) -> Response {
        let message = match self {
            OrgIdError::Missing => "missing X-Org-ID header",
            OrgIdError::InvalidHeader => "invalid X-Org-ID header",
        };
        error_response(StatusCode::BAD_REQUEST, message)
    }
}

/// Read and trim the organization header. Blank values count as missing.
pub fn org_id_from_headers(headers: &HeaderMap) -> Result<OrgId, OrgIdError> {
    let value = headers
        .get(ORG_ID_HEADER)
        .ok_or(OrgIdError::Missing)?
        .to_str()
        .map_err(|_| OrgIdError::InvalidHeader)?
        .trim();
    if value.is_empty() {
        return Err(OrgIdError::Missing);
    }
    Ok(OrgId(value.to_owned()))
}

impl<S: Send + Sync> FromRequestParts<S> for OrgId {
    type Rejection = OrgIdError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        org_id_from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    const HEADER: HeaderName = HeaderName::from_static("x-org-id");

    #[test]
    fn test_org_id_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER, HeaderValue::from_static(" org_acme "));
        assert_eq!(
            org_id_from_headers(&headers),
            Ok(OrgId("org_acme".to_owned()))
        );
    }

    #[test]
    fn test_missing_or_blank_org_id() {
        let mut headers = HeaderMap::new();
        assert_eq!(org_id_from_headers(&headers), Err(OrgIdError::Missing));
        headers.insert(HEADER, HeaderValue::from_static("   "));
        assert_eq!(org_id_from_headers(&headers), Err(OrgIdError::Missing));
    }

    #[test]
    fn test_non_ascii_org_id_is_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER, HeaderValue::from_bytes(b"org\xff").unwrap());
        assert_eq!(
            org_id_from_headers(&headers),
            Err(OrgIdError::InvalidHeader)
        );
    }
}
