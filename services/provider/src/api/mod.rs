//! Typed models and endpoint methods for the CMC Cloud REST API.
//!
//! Each submodule adds methods to [`CmcClient`](crate::CmcClient) for one
//! service. Mutation endpoints only acknowledge the request; completion is
//! observed by polling the corresponding read endpoint.

pub mod billing;
pub mod kubernetes;
pub mod network;
pub mod redis;
pub mod volume;

pub use billing::{BillingMode, NodeRole, BILLING_RESOURCE_REDIS};
pub use kubernetes::{CreateKubernetesRequest, Kubernetes, KubernetesLabels, NodeGroup};
pub use network::SecurityGroup;
pub use redis::{
    CreateRedisConfigurationRequest, CreateRedisInstanceRequest, Datastore, DatastoreMode,
    DatastoreRef, DatastoreVersion, RedisConfiguration, RedisConfigurationParameter,
    RedisInstance,
};
pub use volume::{Volume, VolumeAttachment, VolumeAttachmentDetail};
