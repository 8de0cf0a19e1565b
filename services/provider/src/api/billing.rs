//! Billing mode endpoints.

use std::fmt;
use std::str::FromStr;

use cmccloud_id::{ClusterId, RedisInstanceId};
use serde::{Deserialize, Serialize};

use crate::client::CmcClient;
use crate::error::ApiError;

/// Billing resource type used for Redis instances.
pub const BILLING_RESOURCE_REDIS: &str = "RDS";

/// How a resource is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingMode {
    Monthly,
    Hourly,
}

impl BillingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Hourly => "hourly",
        }
    }
}

impl fmt::Display for BillingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "hourly" => Ok(Self::Hourly),
            other => Err(format!(
                "invalid billing mode '{other}', expected 'monthly' or 'hourly'"
            )),
        }
    }
}

/// Kubernetes node role a billing mode applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Master,
    Worker,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => write!(f, "master"),
            Self::Worker => write!(f, "worker"),
        }
    }
}

#[derive(Debug, Serialize)]
struct SetBillingModeRequest {
    billing_mode: BillingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_type: Option<NodeRole>,
}

#[derive(Debug, Deserialize)]
struct BillingModeResponse {
    #[serde(default)]
    billing_mode: String,
}

impl CmcClient {
    /// Change the billing mode of a cluster's master or worker nodes.
    pub async fn set_kubernetes_billing_mode(
        &self,
        cluster_id: &ClusterId,
        mode: BillingMode,
        role: NodeRole,
    ) -> Result<(), ApiError> {
        let body = SetBillingModeRequest {
            billing_mode: mode,
            node_type: Some(role),
        };
        self.put_ack(&format!("/billing-mode/kubernetes/{cluster_id}"), &body)
            .await
    }

    /// Change the billing mode of a Redis instance.
    pub async fn set_redis_billing_mode(
        &self,
        instance_id: &RedisInstanceId,
        mode: BillingMode,
    ) -> Result<(), ApiError> {
        let body = SetBillingModeRequest {
            billing_mode: mode,
            node_type: None,
        };
        self.put_ack(&format!("/billing-mode/redis/{instance_id}"), &body)
            .await
    }

    /// Current billing mode of a resource, if it reports a known one.
    pub async fn get_billing_mode(
        &self,
        resource_id: &str,
        resource_type: &str,
    ) -> Result<Option<BillingMode>, ApiError> {
        let response: BillingModeResponse = self
            .get_with_query(
                "/billing-mode",
                &[("resource_id", resource_id), ("resource_type", resource_type)],
            )
            .await?;
        Ok(response.billing_mode.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_billing_mode() {
        assert_eq!("monthly".parse::<BillingMode>().unwrap(), BillingMode::Monthly);
        assert_eq!("hourly".parse::<BillingMode>().unwrap(), BillingMode::Hourly);
        assert!("weekly".parse::<BillingMode>().is_err());
        assert!("Monthly".parse::<BillingMode>().is_err());
    }

    #[test]
    fn test_billing_request_shape() {
        let body = SetBillingModeRequest {
            billing_mode: BillingMode::Hourly,
            node_type: Some(NodeRole::Worker),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"billing_mode": "hourly", "node_type": "worker"})
        );
    }
}
