//! Redis configuration group operations.

use std::collections::BTreeMap;

use cmccloud_converge::ConvergencePoller;
use cmccloud_id::RedisConfigurationId;
use tracing::info;

use crate::api::{CreateRedisConfigurationRequest, Datastore, RedisConfiguration};
use crate::error::ProviderError;
use crate::resources::Provider;
use crate::waiters::{self, RedisConfigurationFetcher};

const RESOURCE: &str = "redis configuration";

/// A configuration group to create.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRedisConfiguration {
    pub name: String,
    pub description: String,
    /// Datastore name and version, e.g. `"Redis 7.0"`.
    pub database_version: String,
    /// Matched against mode names by containment, e.g. `"Cluster"`.
    pub database_type: String,
    pub parameters: BTreeMap<String, serde_json::Value>,
}

/// Version id and mode id for `database_version` and `database_type`.
fn resolve_datastore(
    datastores: &[Datastore],
    database_version: &str,
    database_type: &str,
) -> Result<(String, String), ProviderError> {
    let version = datastores
        .iter()
        .flat_map(|datastore| {
            datastore
                .version_infos
                .iter()
                .map(move |version| (datastore, version))
        })
        .find(|(datastore, version)| {
            format!("{} {}", datastore.name, version.version_name) == database_version
        })
        .map(|(_, version)| version)
        .ok_or_else(|| ProviderError::invalid(RESOURCE, "not found database_version"))?;

    let mode = version
        .mode_info
        .iter()
        .find(|mode| mode.name.contains(database_type))
        .ok_or_else(|| ProviderError::invalid(RESOURCE, "not found database_type"))?;

    Ok((version.id.clone(), mode.id.clone()))
}

/// Changes to apply to a configuration group.
///
/// Name and description are always sent together; an unset one keeps its
/// current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedisConfigurationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parameters: Option<BTreeMap<String, serde_json::Value>>,
}

/// Configuration group operations.
pub struct RedisConfigurations<'a> {
    provider: &'a Provider,
}

impl<'a> RedisConfigurations<'a> {
    pub(crate) fn new(provider: &'a Provider) -> Self {
        Self { provider }
    }

    /// Create a configuration group for the named datastore version and mode.
    pub async fn create(
        &self,
        new: &NewRedisConfiguration,
    ) -> Result<RedisConfiguration, ProviderError> {
        let client = self.provider.client();
        let datastores = client
            .list_redis_datastores()
            .await
            .map_err(|e| ProviderError::api("redis datastore", "redis", "list", e))?;
        let (cache_engine, datastore_mode_id) =
            resolve_datastore(&datastores, &new.database_version, &new.database_type)?;

        let request = CreateRedisConfigurationRequest {
            name: new.name.clone(),
            description: new.description.clone(),
            datastore_mode_id,
            cache_engine,
            overrides_config: new.parameters.clone(),
        };
        let id = client
            .create_redis_configuration(&request)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, &new.name, "create", e))?;
        info!(configuration_id = %id, name = %new.name, "Redis configuration created");

        self.read(&id).await
    }

    pub async fn read(
        &self,
        id: &RedisConfigurationId,
    ) -> Result<RedisConfiguration, ProviderError> {
        self.provider
            .client()
            .get_redis_configuration(id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "read", e))
    }

    pub async fn update(
        &self,
        id: &RedisConfigurationId,
        update: &RedisConfigurationUpdate,
    ) -> Result<RedisConfiguration, ProviderError> {
        let client = self.provider.client();

        if update.name.is_some() || update.description.is_some() {
            let current = self.read(id).await?;
            let name = update.name.as_deref().unwrap_or(&current.name);
            let description = update
                .description
                .as_deref()
                .unwrap_or(&current.description);
            client
                .update_redis_configuration(id, name, description)
                .await
                .map_err(|e| ProviderError::api(RESOURCE, id, "update", e))?;
        }

        if let Some(parameters) = &update.parameters {
            client
                .update_redis_configuration_parameters(id, parameters)
                .await
                .map_err(|e| ProviderError::api(RESOURCE, id, "update parameters of", e))?;
        }

        self.read(id).await
    }

    /// Delete a configuration group and wait until it is gone.
    pub async fn delete(&self, id: &RedisConfigurationId) -> Result<(), ProviderError> {
        self.provider
            .client()
            .delete_redis_configuration(id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "delete", e))?;
        info!(configuration_id = %id, "Redis configuration deletion accepted");

        let spec = waiters::redis_configuration_deleted(
            self.provider.polling(),
            self.provider.timeouts().redis_configuration.delete,
        )?;
        ConvergencePoller::new(RedisConfigurationFetcher::new(
            self.provider.client().clone(),
        ))
        .await_state(id, waiters::redis_configuration_status, &spec)
        .await
        .map_err(|e| ProviderError::wait(RESOURCE, id, "delete", e))?;
        Ok(())
    }
}
