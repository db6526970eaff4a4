//! REST client (dashboard or automation → spage server).
//!
//! Every request carries the `X-Org-ID` header; the server scopes all reads
//! and writes to that organization.

use reqwest::Client;
use url::Url;

use super::{ClientError, endpoint_url};
use crate::objects::{
    DeletionResponse, IncidentCreate, IncidentEdit, IncidentResponse, NewIncidentUpdate,
    ORG_ID_HEADER, OrganizationResponse, ServiceResponse, ServiceUpsert,
};

/// Typed HTTP client for one organization's services and incidents.
#[derive(Debug, Clone)]
pub struct StatusClient {
    http: Client,
    base_url: Url,
    org_id: String,
}

impl StatusClient {
    /// Create a new `StatusClient`.
    ///
    /// * `base_url` – root URL of the spage server (e.g. `https://status.example.com`
    ///   or `https://example.com/status/`).
    /// * `org_id` – organization every request is scoped to.
    pub fn new(base_url: Url, org_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            org_id: org_id.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    /// `GET /services`
    pub async fn list_services(&self) -> Result<Vec<ServiceResponse>, ClientError> {
        let url = endpoint_url(&self.base_url, "/services")?;
        let resp = self
            .http
            .get(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /services/{id}`
    pub async fn get_service(&self, service_id: i64) -> Result<ServiceResponse, ClientError> {
        let url = endpoint_url(&self.base_url, &format!("/services/{service_id}"))?;
        let resp = self
            .http
            .get(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /services`
    pub async fn create_service(
        &self,
        body: &ServiceUpsert,
    ) -> Result<ServiceResponse, ClientError> {
        let url = endpoint_url(&self.base_url, "/services")?;
        let resp = self
            .http
            .post(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `PUT /services/{id}`
    pub async fn update_service(
        &self,
        service_id: i64,
        body: &ServiceUpsert,
    ) -> Result<ServiceResponse, ClientError> {
        let url = endpoint_url(&self.base_url, &format!("/services/{service_id}"))?;
        let resp = self
            .http
            .put(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `DELETE /services/{id}` – also deletes every incident of the service.
    pub async fn delete_service(&self, service_id: i64) -> Result<DeletionResponse, ClientError> {
        let url = endpoint_url(&self.base_url, &format!("/services/{service_id}"))?;
        let resp = self
            .http
            .delete(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /incidents`
    pub async fn list_incidents(&self) -> Result<Vec<IncidentResponse>, ClientError> {
        let url = endpoint_url(&self.base_url, "/incidents")?;
        let resp = self
            .http
            .get(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /incidents/{id}`
    pub async fn get_incident(&self, incident_id: i64) -> Result<IncidentResponse, ClientError> {
        let url = endpoint_url(&self.base_url, &format!("/incidents/{incident_id}"))?;
        let resp = self
            .http
            .get(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /incidents`
    pub async fn create_incident(
        &self,
        body: &IncidentCreate,
    ) -> Result<IncidentResponse, ClientError> {
        let url = endpoint_url(&self.base_url, "/incidents")?;
        let resp = self
            .http
            .post(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `PUT /incidents/{id}` – only the fields set in `body` change.
    pub async fn edit_incident(
        &self,
        incident_id: i64,
        body: &IncidentEdit,
    ) -> Result<IncidentResponse, ClientError> {
        let url = endpoint_url(&self.base_url, &format!("/incidents/{incident_id}"))?;
        let resp = self
            .http
            .put(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `DELETE /incidents/{id}`
    pub async fn delete_incident(
        &self,
        incident_id: i64,
    ) -> Result<DeletionResponse, ClientError> {
        let url = endpoint_url(&self.base_url, &format!("/incidents/{incident_id}"))?;
        let resp = self
            .http
            .delete(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /incidents/{id}/updates`
    pub async fn append_incident_update(
        &self,
        incident_id: i64,
        body: &NewIncidentUpdate,
    ) -> Result<IncidentResponse, ClientError> {
        let url = endpoint_url(&self.base_url, &format!("/incidents/{incident_id}/updates"))?;
        let resp = self
            .http
            .post(url)
            .header(ORG_ID_HEADER, &self.org_id)
            .json(body)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /organizations/{org_id}` – display name of this client's organization.
    pub async fn organization(&self) -> Result<OrganizationResponse, ClientError> {
        let path = format!("/organizations/{}", urlencoding::encode(&self.org_id));
        let url = endpoint_url(&self.base_url, &path)?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
