//! Security group endpoints.

use cmccloud_id::SecurityGroupId;
use serde::{Deserialize, Serialize};

use crate::client::CmcClient;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: SecurityGroupId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stateful: bool,
}

impl CmcClient {
    pub async fn get_security_group(
        &self,
        id: &SecurityGroupId,
    ) -> Result<SecurityGroup, ApiError> {
        self.get(&format!("/security-groups/{id}")).await
    }
}
