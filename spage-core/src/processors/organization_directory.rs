//! Organization display-name lookup against the external identity directory.

use std::sync::Arc;

use kanau::processor::Processor;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::config::DirectoryConfig;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No secret key configured.
    #[error("organization directory is not configured")]
    NotConfigured,

    #[error("directory base URL cannot take a path: {0}")]
    InvalidBase(Url),

    #[error("directory request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("directory returned status {0}")]
    Status(u16),

    #[error("directory response has no organization name")]
    MissingName,
}

#[derive(Debug, Clone)]
pub struct GetOrganizationName {
    pub org_id: String,
}

#[derive(Deserialize)]
struct OrganizationRecord {
    name: Option<String>,
}

/// Client for `GET {api_base}/organizations/{org_id}`.
///
/// Reads the directory section on every lookup, so a reload takes effect
/// for the next request.
#[derive(Clone)]
pub struct OrganizationDirectory {
    http_client: reqwest::Client,
    config: Arc<RwLock<DirectoryConfig>>,
}

impl OrganizationDirectory {
    pub fn new(config: Arc<RwLock<DirectoryConfig>>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }
}

/// Append `organizations/{org_id}` to the base, keeping any base path.
pub fn organization_url(api_base: &Url, org_id: &str) -> Result<Url, DirectoryError> {
    let mut url = api_base.clone();
    url.path_segments_mut()
        .map_err(|_| DirectoryError::InvalidBase(api_base.clone()))?
        .pop_if_empty()
        .push("organizations")
        .push(org_id);
    Ok(url)
}

impl Processor<GetOrganizationName> for OrganizationDirectory {
    type Output = String;
    type Error = DirectoryError;

    #[tracing::instrument(skip_all, err, name = "Directory:GetOrganizationName")]
    async fn process(&self, query: GetOrganizationName) -> Result<String, DirectoryError> {
        let (url, secret_key, timeout) = {
            let config = self.config.read().await;
            let secret_key = config
                .secret_key
                .clone()
                .ok_or(DirectoryError::NotConfigured)?;
            (
                organization_url(&config.api_base, &query.org_id)?,
                secret_key,
                config.timeout,
            )
        };

        let response = self
            .http_client
            .get(url)
            .bearer_auth(secret_key)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(org_id = %query.org_id, %status, "Directory lookup rejected");
            return Err(DirectoryError::Status(status.as_u16()));
        }

        let record: OrganizationRecord = response.json().await?;
        let name = record.name.ok_or(DirectoryError::MissingName)?;
        debug!(org_id = %query.org_id, "Resolved organization name");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_organization_url_keeps_base_path() {
        let base = Url::parse("https://api.clerk.dev/v1").unwrap();
        assert_eq!(
            organization_url(&base, "org_2abc").unwrap().as_str(),
            "https://api.clerk.dev/v1/organizations/org_2abc"
        );

        let base = Url::parse("https://directory.example.com/v1/").unwrap();
        assert_eq!(
            organization_url(&base, "org_2abc").unwrap().as_str(),
            "https://directory.example.com/v1/organizations/org_2abc"
        );
    }

    #[test]
    fn test_organization_url_escapes_id() {
        let base = Url::parse("https://directory.example.com").unwrap();
        assert_eq!(
            organization_url(&base, "a/b").unwrap().as_str(),
            "https://directory.example.com/organizations/a%2Fb"
        );
    }

    #[tokio::test]
    async fn test_lookup_without_secret_is_not_configured() {
        let directory = OrganizationDirectory::new(Arc::new(RwLock::new(DirectoryConfig {
            api_base: Url::parse("https://directory.example.com").unwrap(),
            secret_key: None,
            timeout: Duration::from_secs(1),
        })));
        let err = directory
            .process(GetOrganizationName {
                org_id: "acme".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotConfigured));
    }
}
