//! Typed ID definitions for the remote resources the provider manages.

use crate::define_id;

// =============================================================================
// Kubernetes
// =============================================================================

define_id!(ClusterId, "kubernetes cluster");
define_id!(NodeGroupId, "node group");

// =============================================================================
// Redis
// =============================================================================

define_id!(RedisInstanceId, "redis instance");
define_id!(RedisConfigurationId, "redis configuration");

// =============================================================================
// Compute, storage and networking
// =============================================================================

define_id!(ServerId, "server");
define_id!(VolumeId, "volume");
define_id!(SecurityGroupId, "security group");
define_id!(SubnetId, "subnet");

// =============================================================================
// Tests
// =============================================================================
