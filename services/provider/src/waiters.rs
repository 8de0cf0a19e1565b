//! Fetchers, status extractors and wait specs for each resource kind.
//!
//! Every wait in the provider goes through one generic
//! [`ConvergencePoller`](cmccloud_converge::ConvergencePoller); this module
//! supplies the per-resource pieces it is parameterized with.

use std::time::Duration;

use async_trait::async_trait;
use cmccloud_converge::{FetchError, Fetcher, WaitSpec, WaitSpecBuilder, WaitSpecError};
use cmccloud_id::{
    ClusterId, RedisConfigurationId, RedisInstanceId, SecurityGroupId, ServerId, VolumeId,
};

use crate::api::{Kubernetes, RedisConfiguration, RedisInstance, Volume};
use crate::client::CmcClient;
use crate::config::{PollProfile, Polling};

/// Remote status strings.
pub mod status {
    pub const CREATE_IN_PROGRESS: &str = "CREATE_IN_PROGRESS";
    pub const CREATE_COMPLETE: &str = "CREATE_COMPLETE";
    pub const CREATE_FAILED: &str = "CREATE_FAILED";
    pub const UPDATE_IN_PROGRESS: &str = "UPDATE_IN_PROGRESS";
    pub const UPDATE_COMPLETE: &str = "UPDATE_COMPLETE";
    pub const UPDATE_FAILED: &str = "UPDATE_FAILED";
    pub const HEALTHY: &str = "HEALTHY";

    pub const RUNNING: &str = "RUNNING";
    pub const SHUTDOWN: &str = "SHUTDOWN";
    pub const ERROR: &str = "ERROR";

    /// Synthetic membership statuses.
    pub const MEMBERSHIP_REACHED: &str = "true";
    pub const MEMBERSHIP_FAILED: &str = "error";
    pub const MEMBERSHIP_PENDING: &str = "";

    pub const ATTACHED: &str = "Attached";
    pub const DETACHED: &str = "Detached";
}

#[derive(Debug, Clone)]
pub struct KubernetesFetcher {
    client: CmcClient,
}

impl KubernetesFetcher {
    pub fn new(client: CmcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for KubernetesFetcher {
    type Id = ClusterId;
    type Snapshot = Kubernetes;

    async fn fetch(&self, id: &ClusterId) -> Result<Kubernetes, FetchError> {
        Ok(self.client.get_kubernetes(id).await?)
    }
}

#[derive(Debug, Clone)]
pub struct RedisInstanceFetcher {
    client: CmcClient,
}

impl RedisInstanceFetcher {
    pub fn new(client: CmcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for RedisInstanceFetcher {
    type Id = RedisInstanceId;
    type Snapshot = RedisInstance;

    async fn fetch(&self, id: &RedisInstanceId) -> Result<RedisInstance, FetchError> {
        Ok(self.client.get_redis_instance(id).await?)
    }
}

#[derive(Debug, Clone)]
pub struct RedisConfigurationFetcher {
    client: CmcClient,
}

impl RedisConfigurationFetcher {
    pub fn new(client: CmcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for RedisConfigurationFetcher {
    type Id = RedisConfigurationId;
    type Snapshot = RedisConfiguration;

    async fn fetch(&self, id: &RedisConfigurationId) -> Result<RedisConfiguration, FetchError> {
        Ok(self.client.get_redis_configuration(id).await?)
    }
}

#[derive(Debug, Clone)]
pub struct VolumeFetcher {
    client: CmcClient,
}

impl VolumeFetcher {
    pub fn new(client: CmcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for VolumeFetcher {
    type Id = VolumeId;
    type Snapshot = Volume;

    async fn fetch(&self, id: &VolumeId) -> Result<Volume, FetchError> {
        Ok(self.client.get_volume(id).await?)
    }
}

pub fn kubernetes_status(cluster: &Kubernetes) -> String {
    cluster.status.clone()
}

/// Redis job status, case-normalized.
pub fn redis_job_status(instance: &RedisInstance) -> String {
    instance.status.to_uppercase()
}

pub fn redis_configuration_status(_configuration: &RedisConfiguration) -> String {
    "present".to_string()
}

/// `"true"` once `group` is attached (or detached, when `attached` is false).
///
/// An undecodable security group list counts as not there yet.
pub fn security_group_membership(
    group: SecurityGroupId,
    attached: bool,
) -> impl Fn(&RedisInstance) -> String + Send + Sync {
    move |instance| match instance.has_security_group(&group) {
        Some(member) if member == attached => status::MEMBERSHIP_REACHED.to_string(),
        _ => status::MEMBERSHIP_PENDING.to_string(),
    }
}

/// `"Attached"` while the volume lists `server` among its attachments.
pub fn volume_attachment_status(server: ServerId) -> impl Fn(&Volume) -> String + Send + Sync {
    move |volume| {
        if volume.is_attached_to(&server) {
            status::ATTACHED.to_string()
        } else {
            status::DETACHED.to_string()
        }
    }
}

fn profiled(builder: WaitSpecBuilder, profile: PollProfile) -> WaitSpecBuilder {
    builder
        .delay(profile.delay)
        .min_poll_interval(profile.min_poll_interval)
}

pub fn kubernetes_created(polling: &Polling, timeout: Duration) -> Result<WaitSpec, WaitSpecError> {
    profiled(WaitSpec::builder(timeout), polling.kubernetes_status)
        .pending([status::CREATE_IN_PROGRESS])
        .target([status::CREATE_COMPLETE, status::HEALTHY])
        .error([status::CREATE_FAILED])
        .build()
}

pub fn kubernetes_updated(polling: &Polling, timeout: Duration) -> Result<WaitSpec, WaitSpecError> {
    profiled(WaitSpec::builder(timeout), polling.kubernetes_status)
        .pending([status::UPDATE_IN_PROGRESS])
        .target([status::UPDATE_COMPLETE, status::HEALTHY])
        .error([status::UPDATE_FAILED])
        .build()
}

pub fn kubernetes_deleted(polling: &Polling, timeout: Duration) -> Result<WaitSpec, WaitSpecError> {
    profiled(WaitSpec::deletion(timeout), polling.kubernetes_delete).build()
}

pub fn redis_job_finished(polling: &Polling, timeout: Duration) -> Result<WaitSpec, WaitSpecError> {
    profiled(WaitSpec::builder(timeout), polling.redis_job)
        .target([status::HEALTHY, status::RUNNING, status::SHUTDOWN])
        .error([status::ERROR])
        .build()
}

pub fn redis_deleted(polling: &Polling, timeout: Duration) -> Result<WaitSpec, WaitSpecError> {
    profiled(WaitSpec::deletion(timeout), polling.redis_delete).build()
}

pub fn redis_configuration_deleted(
    polling: &Polling,
    timeout: Duration,
) -> Result<WaitSpec, WaitSpecError> {
    profiled(WaitSpec::deletion(timeout), polling.redis_configuration_delete).build()
}

pub fn security_group_settled(
    polling: &Polling,
    timeout: Duration,
) -> Result<WaitSpec, WaitSpecError> {
    profiled(WaitSpec::builder(timeout), polling.security_group_membership)
        .pending([status::MEMBERSHIP_PENDING])
        .target([status::MEMBERSHIP_REACHED])
        .error([status::MEMBERSHIP_FAILED])
        .build()
}

pub fn volume_attached(polling: &Polling, timeout: Duration) -> Result<WaitSpec, WaitSpecError> {
    profiled(WaitSpec::builder(timeout), polling.volume_attachment)
        .pending(["", status::DETACHED])
        .target([status::ATTACHED])
        .build()
}

pub fn volume_detached(polling: &Polling, timeout: Duration) -> Result<WaitSpec, WaitSpecError> {
    profiled(WaitSpec::builder(timeout), polling.volume_attachment)
        .pending(["", status::ATTACHED])
        .target([status::DETACHED])
        .build()
}
