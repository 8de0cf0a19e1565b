//! Redis instance and configuration endpoints.

use std::collections::BTreeMap;

use cmccloud_id::{RedisConfigurationId, RedisInstanceId, SecurityGroupId, SubnetId};
use serde::{Deserialize, Serialize};

use crate::api::billing::BillingMode;
use crate::client::CmcClient;
use crate::error::ApiError;

/// A Redis instance as reported by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisInstance {
    pub id: RedisInstanceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub datastore_name: String,
    #[serde(default)]
    pub datastore_version: String,
    #[serde(default)]
    pub datastore_mode: String,
    /// JSON-encoded array of attached security group ids.
    #[serde(default)]
    pub security_client_ids: String,
    #[serde(default)]
    pub flavor_id: String,
    #[serde(default)]
    pub volume_size: u32,
    #[serde(default)]
    pub subnet_id: String,
    #[serde(default)]
    pub group_config_id: String,
    #[serde(default)]
    pub created: String,
}

impl RedisInstance {
    /// Decode the attached security groups.
    pub fn security_group_ids(&self) -> Result<Vec<SecurityGroupId>, serde_json::Error> {
        if self.security_client_ids.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.security_client_ids)
    }

    /// Whether `group` is attached; `None` if the list cannot be decoded.
    pub fn has_security_group(&self, group: &SecurityGroupId) -> Option<bool> {
        self.security_group_ids()
            .ok()
            .map(|ids| ids.contains(group))
    }
}

/// Datastore engine, version and mode selected for a new instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatastoreRef {
    pub datastore_code: String,
    pub datastore_version_id: String,
    pub datastore_mode_id: String,
}

/// Request body for instance creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRedisInstanceRequest {
    #[serde(rename = "billing_mode")]
    pub billing_mode: BillingMode,
    pub name: String,
    /// Sent as a comma-separated list.
    #[serde(serialize_with = "comma_joined")]
    pub security_group_ids: Vec<SecurityGroupId>,
    pub flavor_id: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_id: Option<String>,
    pub volume_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_configuration_id: Option<RedisConfigurationId>,
    pub network_id: String,
    pub subnet_id: SubnetId,
    pub datastore: DatastoreRef,
    #[serde(rename = "datastore_type")]
    pub datastore_type: String,
    /// JSON-encoded placement metadata (zones, replicas).
    pub request_metadata: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<String>>,
}

fn comma_joined<S>(ids: &[SecurityGroupId], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let joined = ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    serializer.serialize_str(&joined)
}

#[derive(Debug, Deserialize)]
struct CreateRedisInstanceResponse {
    data: CreatedInstance,
}

#[derive(Debug, Deserialize)]
struct CreatedInstance {
    instance_id: RedisInstanceId,
}

/// A configuration group (parameter template).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisConfiguration {
    pub id: RedisConfigurationId,
    /// Alternate id some default templates must be referenced by.
    #[serde(default, rename = "id2")]
    pub alternate_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub datastore_name: String,
    #[serde(default)]
    pub datastore_version: String,
    #[serde(default)]
    pub datastore_mode: String,
    #[serde(default)]
    pub parameters: Vec<RedisConfigurationParameter>,
}

impl RedisConfiguration {
    /// Parameters as a name/value map.
    pub fn parameter_map(&self) -> BTreeMap<String, serde_json::Value> {
        self.parameters
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect()
    }
}

/// A datastore engine with its published versions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datastore {
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version_infos: Vec<DatastoreVersion>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatastoreVersion {
    pub id: String,
    #[serde(default)]
    pub version_name: String,
    #[serde(default)]
    pub mode_info: Vec<DatastoreMode>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatastoreMode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
}

/// Request body for configuration group creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRedisConfigurationRequest {
    pub name: String,
    pub description: String,
    pub datastore_mode_id: String,
    /// Datastore version id.
    pub cache_engine: String,
    pub overrides_config: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CreateRedisConfigurationResponse {
    data: CreatedConfiguration,
}

#[derive(Debug, Deserialize)]
struct CreatedConfiguration {
    id: RedisConfigurationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisConfigurationParameter {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Rename<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ConfigurationInfo<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct Password<'a> {
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct ConfigurationGroup<'a> {
    group_configuration_id: &'a RedisConfigurationId,
}

#[derive(Debug, Serialize)]
struct Parameters<'a> {
    parameters: &'a BTreeMap<String, serde_json::Value>,
}

impl CmcClient {
    /// Create an instance and return its id.
    pub async fn create_redis_instance(
        &self,
        request: &CreateRedisInstanceRequest,
    ) -> Result<RedisInstanceId, ApiError> {
        let response: CreateRedisInstanceResponse = self.post("/redis/instances", request).await?;
        Ok(response.data.instance_id)
    }

    pub async fn get_redis_instance(
        &self,
        id: &RedisInstanceId,
    ) -> Result<RedisInstance, ApiError> {
        self.get(&format!("/redis/instances/{id}")).await
    }

    pub async fn delete_redis_instance(&self, id: &RedisInstanceId) -> Result<(), ApiError> {
        self.delete(&format!("/redis/instances/{id}")).await
    }

    pub async fn rename_redis_instance(
        &self,
        id: &RedisInstanceId,
        name: &str,
    ) -> Result<(), ApiError> {
        self.put_ack(&format!("/redis/instances/{id}"), &Rename { name })
            .await
    }

    pub async fn set_redis_password(
        &self,
        id: &RedisInstanceId,
        password: &str,
    ) -> Result<(), ApiError> {
        self.put_ack(
            &format!("/redis/instances/{id}/password"),
            &Password { password },
        )
        .await
    }

    pub async fn set_redis_configuration_group(
        &self,
        id: &RedisInstanceId,
        configuration_id: &RedisConfigurationId,
    ) -> Result<(), ApiError> {
        self.put_ack(
            &format!("/redis/instances/{id}/configuration"),
            &ConfigurationGroup {
                group_configuration_id: configuration_id,
            },
        )
        .await
    }

    pub async fn attach_redis_security_group(
        &self,
        id: &RedisInstanceId,
        group: &SecurityGroupId,
    ) -> Result<(), ApiError> {
        self.post_ack(
            &format!("/redis/instances/{id}/security-groups/{group}"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn detach_redis_security_group(
        &self,
        id: &RedisInstanceId,
        group: &SecurityGroupId,
    ) -> Result<(), ApiError> {
        self.delete(&format!("/redis/instances/{id}/security-groups/{group}"))
            .await
    }

    /// Create a configuration group and return its id.
    pub async fn create_redis_configuration(
        &self,
        request: &CreateRedisConfigurationRequest,
    ) -> Result<RedisConfigurationId, ApiError> {
        let response: CreateRedisConfigurationResponse =
            self.post("/redis/configurations", request).await?;
        Ok(response.data.id)
    }

    /// Datastore engines available for Redis.
    pub async fn list_redis_datastores(&self) -> Result<Vec<Datastore>, ApiError> {
        self.get("/redis/datastores").await
    }

    pub async fn get_redis_configuration(
        &self,
        id: &RedisConfigurationId,
    ) -> Result<RedisConfiguration, ApiError> {
        self.get(&format!("/redis/configurations/{id}")).await
    }

    pub async fn update_redis_configuration(
        &self,
        id: &RedisConfigurationId,
        name: &str,
        description: &str,
    ) -> Result<(), ApiError> {
        self.put_ack(
            &format!("/redis/configurations/{id}"),
            &ConfigurationInfo { name, description },
        )
        .await
    }

    pub async fn update_redis_configuration_parameters(
        &self,
        id: &RedisConfigurationId,
        parameters: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), ApiError> {
        self.put_ack(
            &format!("/redis/configurations/{id}/parameters"),
            &Parameters { parameters },
        )
        .await
    }

    pub async fn delete_redis_configuration(
        &self,
        id: &RedisConfigurationId,
    ) -> Result<(), ApiError> {
        self.delete(&format!("/redis/configurations/{id}")).await
    }

    /// Default configuration templates shipped by the platform.
    pub async fn list_default_redis_configurations(
        &self,
    ) -> Result<Vec<RedisConfiguration>, ApiError> {
        self.get_with_query(
            "/redis/configurations",
            &[
                ("page", "1"),
                ("size", "1000"),
                ("datastoreCode", "redis"),
                ("getDefault", "true"),
            ],
        )
        .await
    }
}
