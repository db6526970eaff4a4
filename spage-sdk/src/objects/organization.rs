use serde::{Deserialize, Serialize};

/// Response for `GET /organizations/{org_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationResponse {
    pub id: String,
    pub name: String,
}
