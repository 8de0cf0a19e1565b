//! Kubernetes cluster operations.
//!
//! Worker pool changes are the interesting part: the default worker node
//! group's count and autoscaling bounds are changed through separate remote
//! calls, ordered by the mutation planner so the remote never sees a count
//! outside its bounds.

use async_trait::async_trait;
use cmccloud_converge::{
    plan_worker_pool, BoxError, ConvergencePoller, MutableField, MutationPlan, PlanExecutor,
    WorkerPoolChange, WorkerPoolMutator, WorkerPoolState,
};
use cmccloud_id::{ClusterId, NodeGroupId};
use tracing::{info, warn};

use crate::api::{BillingMode, CreateKubernetesRequest, Kubernetes, NodeGroup, NodeRole};
use crate::client::CmcClient;
use crate::error::ProviderError;
use crate::resources::Provider;
use crate::waiters::{self, KubernetesFetcher};

const RESOURCE: &str = "kubernetes cluster";

/// Node group whose counts back the cluster's default worker block.
pub const DEFAULT_WORKER_GROUP: &str = "default-worker";

/// Observed state of a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct KubernetesState {
    pub cluster: Kubernetes,
    pub default_master: MasterNodes,
    pub default_worker: WorkerNodes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterNodes {
    pub node_count: u32,
    pub flavor_id: String,
    pub billing_mode: Option<BillingMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerNodes {
    /// Count and bounds of the default worker group; `None` if the cluster
    /// has no such group.
    pub pool: Option<WorkerPoolState>,
    pub flavor_id: String,
    pub billing_mode: Option<BillingMode>,
}

/// Desired worker pool values plus which of them the caller changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolUpdate {
    pub desired: WorkerPoolState,
    pub node_count_changed: bool,
    pub min_node_count_changed: bool,
    pub max_node_count_changed: bool,
}

impl WorkerPoolUpdate {
    /// Change flags from a diff of the previously applied values.
    pub fn between(prior: WorkerPoolState, desired: WorkerPoolState) -> Self {
        Self {
            desired,
            node_count_changed: prior.node_count != desired.node_count,
            min_node_count_changed: prior.min_node_count != desired.min_node_count,
            max_node_count_changed: prior.max_node_count != desired.max_node_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.node_count_changed || self.min_node_count_changed || self.max_node_count_changed)
    }

    /// The desired block must itself satisfy `min <= node_count <= max`.
    pub fn validate(&self) -> Result<(), ProviderError> {
        validate_worker_window(
            self.desired.node_count,
            self.desired.min_node_count,
            self.desired.max_node_count,
        )
    }

    /// Change set against the live node group.
    pub fn against(&self, live: &NodeGroup) -> WorkerPoolChange {
        WorkerPoolChange {
            node_count: MutableField::declared(
                live.node_count,
                self.desired.node_count,
                self.node_count_changed,
            ),
            min_node_count: MutableField::declared(
                live.min_node_count,
                self.desired.min_node_count,
                self.min_node_count_changed,
            ),
            max_node_count: MutableField::declared(
                live.max_node_count,
                self.desired.max_node_count,
                self.max_node_count_changed,
            ),
        }
    }
}

/// Changes to apply to a cluster. `None` leaves an attribute alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubernetesUpdate {
    pub default_worker: Option<WorkerPoolUpdate>,
    pub master_billing_mode: Option<BillingMode>,
    pub worker_billing_mode: Option<BillingMode>,
}

/// A planned worker pool change against the live node group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPlan {
    pub node_group: NodeGroup,
    pub change: WorkerPoolChange,
    pub plan: MutationPlan,
}

/// Fire-and-forget node group calls for one cluster.
struct NodeGroupMutator {
    client: CmcClient,
    cluster_id: ClusterId,
    node_group_id: NodeGroupId,
}

#[async_trait]
impl WorkerPoolMutator for NodeGroupMutator {
    async fn set_bounds(&self, min: u32, max: u32) -> Result<(), BoxError> {
        self.client
            .update_node_group(&self.cluster_id, &self.node_group_id, min, max)
            .await
            .map_err(Into::into)
    }

    async fn resize(&self, node_count: u32) -> Result<(), BoxError> {
        self.client
            .resize_node_group(&self.cluster_id, &self.node_group_id, node_count)
            .await
            .map_err(Into::into)
    }
}

/// Cluster operations.
pub struct KubernetesClusters<'a> {
    provider: &'a Provider,
}

impl<'a> KubernetesClusters<'a> {
    pub(crate) fn new(provider: &'a Provider) -> Self {
        Self { provider }
    }

    fn poller(&self) -> ConvergencePoller<KubernetesFetcher> {
        ConvergencePoller::new(KubernetesFetcher::new(self.provider.client().clone()))
    }

    /// Create a cluster and wait until it is healthy.
    pub async fn create(
        &self,
        request: &CreateKubernetesRequest,
    ) -> Result<KubernetesState, ProviderError> {
        validate_worker_window(
            request.node_count,
            request.labels.min_node_count,
            request.labels.max_node_count,
        )?;

        let client = self.provider.client();
        let cluster = client
            .create_kubernetes(request)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, &request.name, "create", e))?;
        info!(
            cluster_id = %cluster.id,
            name = %request.name,
            "Kubernetes cluster creation accepted"
        );

        let spec = waiters::kubernetes_created(
            self.provider.polling(),
            self.provider.timeouts().kubernetes.create,
        )?;
        self.poller()
            .await_state(&cluster.id, waiters::kubernetes_status, &spec)
            .await
            .map_err(|e| ProviderError::wait(RESOURCE, cluster.id, "create", e))?;

        self.read(&cluster.id).await
    }

    /// Read a cluster. Worker counts come from the default worker node group,
    /// not from the creation-time labels.
    pub async fn read(&self, id: &ClusterId) -> Result<KubernetesState, ProviderError> {
        let client = self.provider.client();
        let cluster = client
            .get_kubernetes(id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "read", e))?;
        let node_groups = client
            .list_node_groups(id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "list node groups of", e))?;

        let pool = find_default_worker(&node_groups).map(|group| {
            WorkerPoolState::new(group.node_count, group.min_node_count, group.max_node_count)
        });

        Ok(KubernetesState {
            default_master: MasterNodes {
                node_count: cluster.master_count,
                flavor_id: cluster.master_flavor_id.clone(),
                billing_mode: cluster.master_billing_mode.parse().ok(),
            },
            default_worker: WorkerNodes {
                pool,
                flavor_id: cluster.node_flavor_id.clone(),
                billing_mode: cluster.node_billing_mode.parse().ok(),
            },
            cluster,
        })
    }

    /// Plan a worker pool change against the live default worker group.
    pub async fn plan_worker_update(
        &self,
        id: &ClusterId,
        update: &WorkerPoolUpdate,
    ) -> Result<WorkerPlan, ProviderError> {
        update.validate()?;

        let node_groups = self
            .provider
            .client()
            .list_node_groups(id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "list node groups of", e))?;
        let node_group = find_default_worker(&node_groups)
            .cloned()
            .ok_or_else(|| ProviderError::MissingNodeGroup {
                resource: RESOURCE,
                id: id.to_string(),
                name: DEFAULT_WORKER_GROUP.to_string(),
            })?;

        let spec = waiters::kubernetes_updated(
            self.provider.polling(),
            self.provider.timeouts().kubernetes.update,
        )?;
        let change = update.against(&node_group);
        let plan = plan_worker_pool(&change, &spec);

        info!(
            cluster_id = %id,
            node_group_id = %node_group.id,
            current = %change.current(),
            desired = %change.desired(),
            order = %plan.order(),
            steps = plan.len(),
            "Planned worker pool update"
        );

        Ok(WorkerPlan {
            node_group,
            change,
            plan,
        })
    }

    /// Apply a planned worker pool change step by step.
    pub async fn apply_worker_plan(
        &self,
        id: &ClusterId,
        worker_plan: &WorkerPlan,
    ) -> Result<(), ProviderError> {
        let mutator = NodeGroupMutator {
            client: self.provider.client().clone(),
            cluster_id: *id,
            node_group_id: worker_plan.node_group.id,
        };
        let poller = self.poller();

        PlanExecutor::new(&poller, &mutator)
            .run(id, &worker_plan.plan, waiters::kubernetes_status)
            .await
            .map_err(|abort| {
                warn!(
                    cluster_id = %id,
                    step = abort.step,
                    completed = abort.completed,
                    "Worker pool update aborted"
                );
                ProviderError::wait(RESOURCE, id, "update worker pool of", abort)
            })?;
        Ok(())
    }

    /// Apply worker pool and billing changes, then re-read the cluster.
    pub async fn update(
        &self,
        id: &ClusterId,
        update: &KubernetesUpdate,
    ) -> Result<KubernetesState, ProviderError> {
        if let Some(worker) = update.default_worker.filter(|w| !w.is_empty()) {
            let worker_plan = self.plan_worker_update(id, &worker).await?;
            self.apply_worker_plan(id, &worker_plan).await?;
        }

        let client = self.provider.client();
        if let Some(mode) = update.master_billing_mode {
            client
                .set_kubernetes_billing_mode(id, mode, NodeRole::Master)
                .await
                .map_err(|e| ProviderError::api(RESOURCE, id, "change master billing mode of", e))?;
        }
        if let Some(mode) = update.worker_billing_mode {
            client
                .set_kubernetes_billing_mode(id, mode, NodeRole::Worker)
                .await
                .map_err(|e| ProviderError::api(RESOURCE, id, "change worker billing mode of", e))?;
        }

        self.read(id).await
    }

    /// Delete a cluster and wait until it is gone.
    pub async fn delete(&self, id: &ClusterId) -> Result<(), ProviderError> {
        self.provider
            .client()
            .delete_kubernetes(id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "delete", e))?;
        info!(cluster_id = %id, "Kubernetes cluster deletion accepted");

        let spec = waiters::kubernetes_deleted(
            self.provider.polling(),
            self.provider.timeouts().kubernetes.delete,
        )?;
        self.poller()
            .await_state(id, waiters::kubernetes_status, &spec)
            .await
            .map_err(|e| ProviderError::wait(RESOURCE, id, "delete", e))?;
        Ok(())
    }
}

fn find_default_worker(node_groups: &[NodeGroup]) -> Option<&NodeGroup> {
    node_groups
        .iter()
        .find(|group| group.name == DEFAULT_WORKER_GROUP)
}

fn validate_worker_window(node_count: u32, min: u32, max: u32) -> Result<(), ProviderError> {
    if min > node_count {
        return Err(ProviderError::invalid(
            RESOURCE,
            "default_worker: min_node_count must be <= node_count",
        ));
    }
    if max < node_count {
        return Err(ProviderError::invalid(
            RESOURCE,
            "default_worker: max_node_count must be >= node_count",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmccloud_converge::PlanOrder;

    fn node_group(node_count: u32, min: u32, max: u32) -> NodeGroup {
        NodeGroup {
            id: NodeGroupId::new(),
            name: DEFAULT_WORKER_GROUP.to_string(),
            node_count,
            min_node_count: min,
            max_node_count: max,
            status: String::new(),
        }
    }

    #[test]
    fn test_update_flags_from_diff() {
        let update = WorkerPoolUpdate::between(
            WorkerPoolState::new(3, 1, 5),
            WorkerPoolState::new(3, 1, 8),
        );
        assert!(!update.node_count_changed);
        assert!(!update.min_node_count_changed);
        assert!(update.max_node_count_changed);
        assert!(!update.is_empty());
    }

    #[test]
    fn test_validate_rejects_inconsistent_block() {
        let update = WorkerPoolUpdate::between(
            WorkerPoolState::new(3, 1, 5),
            WorkerPoolState::new(6, 1, 5),
        );
        let err = update.validate().unwrap_err();
        assert!(err.to_string().contains("max_node_count must be >= node_count"));

        let update = WorkerPoolUpdate::between(
            WorkerPoolState::new(3, 1, 5),
            WorkerPoolState::new(3, 4, 5),
        );
        let err = update.validate().unwrap_err();
        assert!(err.to_string().contains("min_node_count must be <= node_count"));
    }

    #[test]
    fn test_change_uses_live_values() {
        // Prior config said 3 nodes; the autoscaler has since grown the pool to 5.
        let update = WorkerPoolUpdate::between(
            WorkerPoolState::new(3, 1, 10),
            WorkerPoolState::new(3, 1, 4),
        );
        let change = update.against(&node_group(5, 1, 10));

        assert_eq!(change.current(), WorkerPoolState::new(5, 1, 10));
        assert!(!change.count_changed());
        assert!(change.bounds_changed());
    }

    #[test]
    fn test_live_count_outside_new_window_resizes_first() {
        let update = WorkerPoolUpdate {
            desired: WorkerPoolState::new(3, 1, 3),
            node_count_changed: true,
            min_node_count_changed: true,
            max_node_count_changed: true,
        };
        let change = update.against(&node_group(5, 3, 8));
        let spec = waiters::kubernetes_updated(
            &crate::config::Polling::default(),
            std::time::Duration::from_secs(600),
        )
        .unwrap();

        let plan = plan_worker_pool(&change, &spec);

        assert_eq!(plan.order(), PlanOrder::ResizeFirst);
    }
}
