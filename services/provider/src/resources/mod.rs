//! Resource operations.
//!
//! [`Provider`] owns the REST client plus the configured timeouts and poll
//! profiles and hands out one operation handle per resource kind.

pub mod kubernetes;
pub mod redis_configuration;
pub mod redis_instance;
pub mod volume_attachment;

use crate::client::CmcClient;
use crate::config::{Config, Polling, Timeouts};
use crate::error::ProviderError;

pub use kubernetes::{
    KubernetesClusters, KubernetesState, KubernetesUpdate, MasterNodes, WorkerNodes, WorkerPlan,
    WorkerPoolUpdate, DEFAULT_WORKER_GROUP,
};
pub use redis_configuration::{
    NewRedisConfiguration, RedisConfigurationUpdate, RedisConfigurations,
};
pub use redis_instance::{
    ConfigurationTarget, RedisInstanceState, RedisInstanceUpdate, RedisInstances,
    SecurityGroupChange,
};
pub use volume_attachment::VolumeAttachments;

/// Entry point for resource operations.
#[derive(Debug, Clone)]
pub struct Provider {
    client: CmcClient,
    timeouts: Timeouts,
    polling: Polling,
}

impl Provider {
    /// Build a provider from configuration.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = CmcClient::new(&config.api).map_err(ProviderError::Client)?;
        Ok(Self::with_client(client, config.timeouts, config.polling))
    }

    pub fn with_client(client: CmcClient, timeouts: Timeouts, polling: Polling) -> Self {
        Self {
            client,
            timeouts,
            polling,
        }
    }

    pub fn client(&self) -> &CmcClient {
        &self.client
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub fn polling(&self) -> &Polling {
        &self.polling
    }

    pub fn kubernetes(&self) -> KubernetesClusters<'_> {
        KubernetesClusters::new(self)
    }

    pub fn redis_instances(&self) -> RedisInstances<'_> {
        RedisInstances::new(self)
    }

    pub fn redis_configurations(&self) -> RedisConfigurations<'_> {
        RedisConfigurations::new(self)
    }

    pub fn volume_attachments(&self) -> VolumeAttachments<'_> {
        VolumeAttachments::new(self)
    }
}
