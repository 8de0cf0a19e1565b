//! Kubernetes cluster and node group endpoints.

use cmccloud_id::{ClusterId, NodeGroupId, SubnetId};
use serde::{Deserialize, Serialize};

use crate::api::billing::BillingMode;
use crate::client::CmcClient;
use crate::error::ApiError;

/// A Kubernetes cluster as reported by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kubernetes {
    pub id: ClusterId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub master_count: u32,
    #[serde(default)]
    pub master_flavor_id: String,
    #[serde(default)]
    pub master_billing_mode: String,
    #[serde(default)]
    pub node_count: u32,
    #[serde(default)]
    pub node_flavor_id: String,
    #[serde(default)]
    pub node_billing_mode: String,
    #[serde(default)]
    pub subnet_id: String,
    #[serde(default)]
    pub keypair: String,
    #[serde(default)]
    pub docker_volume_size: u32,
    #[serde(default)]
    pub create_timeout: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub labels: KubernetesLabels,
}

/// Cluster labels. Min/max node counts here are creation-time values only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KubernetesLabels {
    #[serde(default)]
    pub kube_dashboard_enabled: bool,
    #[serde(default)]
    pub metrics_server_enabled: bool,
    #[serde(default)]
    pub npd_enabled: bool,
    #[serde(default)]
    pub auto_scaling_enabled: bool,
    #[serde(default)]
    pub auto_healing_enabled: bool,
    #[serde(default)]
    pub min_node_count: u32,
    #[serde(default)]
    pub max_node_count: u32,
    #[serde(default)]
    pub kube_tag: String,
    #[serde(default, rename = "network-driver", alias = "network_driver")]
    pub network_driver: String,
    #[serde(default)]
    pub calico_ipv4pool: String,
    #[serde(default)]
    pub docker_volume_type: String,
    #[serde(default, rename = "zone", alias = "availability_zone")]
    pub availability_zone: String,
}

/// A node group of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroup {
    pub id: NodeGroupId,
    pub name: String,
    pub node_count: u32,
    #[serde(default)]
    pub min_node_count: u32,
    #[serde(default)]
    pub max_node_count: u32,
    #[serde(default)]
    pub status: String,
}

/// Request body for cluster creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreateKubernetesRequest {
    pub name: String,
    pub master_count: u32,
    pub master_flavor_id: String,
    pub master_billing_mode: BillingMode,
    pub node_count: u32,
    pub node_flavor_id: String,
    pub worker_billing_mode: BillingMode,
    pub keypair: String,
    pub docker_volume_size: u32,
    pub subnet_id: SubnetId,
    pub create_timeout: u32,
    pub zone: String,
    pub labels: KubernetesLabels,
}

#[derive(Debug, Serialize)]
struct NodeGroupBounds {
    min_node_count: u32,
    max_node_count: u32,
}

#[derive(Debug, Serialize)]
struct ResizeNodeGroup<'a> {
    node_count: u32,
    nodegroup: &'a NodeGroupId,
}

impl CmcClient {
    pub async fn create_kubernetes(
        &self,
        request: &CreateKubernetesRequest,
    ) -> Result<Kubernetes, ApiError> {
        self.post("/kubernetes", request).await
    }

    pub async fn get_kubernetes(&self, id: &ClusterId) -> Result<Kubernetes, ApiError> {
        self.get(&format!("/kubernetes/{id}")).await
    }

    pub async fn delete_kubernetes(&self, id: &ClusterId) -> Result<(), ApiError> {
        self.delete(&format!("/kubernetes/{id}")).await
    }

    pub async fn list_node_groups(&self, id: &ClusterId) -> Result<Vec<NodeGroup>, ApiError> {
        self.get(&format!("/kubernetes/{id}/nodegroups")).await
    }

    /// Set a node group's autoscaling bounds.
    pub async fn update_node_group(
        &self,
        cluster_id: &ClusterId,
        node_group_id: &NodeGroupId,
        min_node_count: u32,
        max_node_count: u32,
    ) -> Result<(), ApiError> {
        let body = NodeGroupBounds {
            min_node_count,
            max_node_count,
        };
        self.put_ack(
            &format!("/kubernetes/{cluster_id}/nodegroups/{node_group_id}"),
            &body,
        )
        .await
    }

    /// Resize a node group.
    pub async fn resize_node_group(
        &self,
        cluster_id: &ClusterId,
        node_group_id: &NodeGroupId,
        node_count: u32,
    ) -> Result<(), ApiError> {
        let body = ResizeNodeGroup {
            node_count,
            nodegroup: node_group_id,
        };
        self.post_ack(&format!("/kubernetes/{cluster_id}/actions/resize"), &body)
            .await
    }
}
