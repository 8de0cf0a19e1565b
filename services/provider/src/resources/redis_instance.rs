//! Redis instance operations.

use std::collections::BTreeSet;

use cmccloud_converge::ConvergencePoller;
use cmccloud_id::{RedisConfigurationId, RedisInstanceId, SecurityGroupId};
use tracing::{debug, info, warn};

use crate::api::{
    BillingMode, CreateRedisInstanceRequest, RedisInstance, BILLING_RESOURCE_REDIS,
};
use crate::error::{ApiError, ProviderError};
use crate::resources::Provider;
use crate::waiters::{self, RedisInstanceFetcher};

const RESOURCE: &str = "redis instance";

/// Observed state of an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RedisInstanceState {
    pub instance: RedisInstance,
    pub billing_mode: Option<BillingMode>,
    pub security_group_ids: Vec<SecurityGroupId>,
}

/// Configuration group to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationTarget {
    /// A specific configuration group.
    Group(RedisConfigurationId),
    /// The platform default template for the instance's engine, version and mode.
    Default,
}

/// Security groups to detach and attach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityGroupChange {
    pub desired: Vec<SecurityGroupId>,
    pub detach: Vec<SecurityGroupId>,
    pub attach: Vec<SecurityGroupId>,
}

impl SecurityGroupChange {
    pub fn between(current: &[SecurityGroupId], desired: &[SecurityGroupId]) -> Self {
        let current: BTreeSet<_> = current.iter().copied().collect();
        let wanted: BTreeSet<_> = desired.iter().copied().collect();
        Self {
            desired: wanted.iter().copied().collect(),
            detach: current.difference(&wanted).copied().collect(),
            attach: wanted.difference(&current).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detach.is_empty() && self.attach.is_empty()
    }
}

/// Changes to apply to an instance, in the order they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedisInstanceUpdate {
    pub name: Option<String>,
    pub billing_mode: Option<BillingMode>,
    pub password: Option<String>,
    pub configuration: Option<ConfigurationTarget>,
    pub security_groups: Option<SecurityGroupChange>,
}

/// Instance operations.
pub struct RedisInstances<'a> {
    provider: &'a Provider,
}

impl<'a> RedisInstances<'a> {
    pub(crate) fn new(provider: &'a Provider) -> Self {
        Self { provider }
    }

    fn poller(&self) -> ConvergencePoller<RedisInstanceFetcher> {
        ConvergencePoller::new(RedisInstanceFetcher::new(self.provider.client().clone()))
    }

    async fn wait_job_finished(
        &self,
        id: &RedisInstanceId,
        action: &'static str,
        timeout: std::time::Duration,
    ) -> Result<RedisInstance, ProviderError> {
        let spec = waiters::redis_job_finished(self.provider.polling(), timeout)?;
        let presence = self
            .poller()
            .await_state(id, waiters::redis_job_status, &spec)
            .await
            .map_err(|e| ProviderError::wait(RESOURCE, id, action, e))?;
        presence.into_present().ok_or_else(|| {
            ProviderError::api(
                RESOURCE,
                id,
                action,
                ApiError::NotFound {
                    path: format!("/redis/instances/{id}"),
                },
            )
        })
    }

    /// Create an instance and wait for its job to finish.
    ///
    /// Rejects security groups that disagree on statefulness before anything
    /// is submitted.
    pub async fn create(
        &self,
        request: &CreateRedisInstanceRequest,
    ) -> Result<RedisInstanceState, ProviderError> {
        self.check_security_group_conflict(&request.security_group_ids)
            .await?;

        let id = self
            .provider
            .client()
            .create_redis_instance(request)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, &request.name, "create", e))?;
        info!(instance_id = %id, name = %request.name, "Redis instance creation accepted");

        self.wait_job_finished(&id, "create", self.provider.timeouts().redis_instance.create)
            .await?;
        self.read(&id).await
    }

    /// Read an instance with its billing mode and security groups.
    pub async fn read(&self, id: &RedisInstanceId) -> Result<RedisInstanceState, ProviderError> {
        let client = self.provider.client();
        let instance = client
            .get_redis_instance(id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "read", e))?;

        let billing_mode = match client
            .get_billing_mode(&id.to_string(), BILLING_RESOURCE_REDIS)
            .await
        {
            Ok(mode) => mode,
            Err(e) => {
                warn!(instance_id = %id, error = %e, "Could not read billing mode");
                None
            }
        };

        let security_group_ids = instance.security_group_ids().map_err(|e| {
            ProviderError::api(
                RESOURCE,
                id,
                "read",
                ApiError::Decode {
                    path: format!("/redis/instances/{id}"),
                    message: format!("security_client_ids: {e}"),
                },
            )
        })?;

        Ok(RedisInstanceState {
            instance,
            billing_mode,
            security_group_ids,
        })
    }

    /// Apply changes in order: name, billing mode, password, configuration
    /// group, security groups. Stops at the first failure.
    pub async fn update(
        &self,
        id: &RedisInstanceId,
        update: &RedisInstanceUpdate,
    ) -> Result<RedisInstanceState, ProviderError> {
        let client = self.provider.client();
        let timeout = self.provider.timeouts().redis_instance.update;

        if let Some(name) = &update.name {
            client
                .rename_redis_instance(id, name)
                .await
                .map_err(|e| ProviderError::api(RESOURCE, id, "rename", e))?;
        }

        if let Some(mode) = update.billing_mode {
            client
                .set_redis_billing_mode(id, mode)
                .await
                .map_err(|e| ProviderError::api(RESOURCE, id, "change billing mode of", e))?;
        }

        if let Some(password) = &update.password {
            client
                .set_redis_password(id, password)
                .await
                .map_err(|e| ProviderError::api(RESOURCE, id, "update password of", e))?;
            self.wait_job_finished(id, "update password of", timeout)
                .await?;
        }

        if let Some(target) = update.configuration {
            let configuration_id = match target {
                ConfigurationTarget::Group(configuration_id) => configuration_id,
                ConfigurationTarget::Default => self.resolve_default_configuration(id).await?,
            };
            client
                .set_redis_configuration_group(id, &configuration_id)
                .await
                .map_err(|e| ProviderError::api(RESOURCE, id, "set configuration group of", e))?;
            self.wait_job_finished(id, "set configuration group of", timeout)
                .await?;
        }

        if let Some(change) = update.security_groups.as_ref().filter(|c| !c.is_empty()) {
            self.check_security_group_conflict(&change.desired).await?;
            for group in &change.detach {
                self.detach_security_group(id, group).await?;
            }
            for group in &change.attach {
                self.attach_security_group(id, group).await?;
            }
        }

        self.read(id).await
    }

    /// Attach a security group and wait until the instance lists it.
    pub async fn attach_security_group(
        &self,
        id: &RedisInstanceId,
        group: &SecurityGroupId,
    ) -> Result<(), ProviderError> {
        self.provider
            .client()
            .attach_redis_security_group(id, group)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "attach security group to", e))?;
        self.wait_membership(id, *group, true, "attach security group to")
            .await
    }

    /// Detach a security group and wait until the instance no longer lists it.
    pub async fn detach_security_group(
        &self,
        id: &RedisInstanceId,
        group: &SecurityGroupId,
    ) -> Result<(), ProviderError> {
        self.provider
            .client()
            .detach_redis_security_group(id, group)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "detach security group from", e))?;
        self.wait_membership(id, *group, false, "detach security group from")
            .await
    }

    async fn wait_membership(
        &self,
        id: &RedisInstanceId,
        group: SecurityGroupId,
        attached: bool,
        action: &'static str,
    ) -> Result<(), ProviderError> {
        let spec = waiters::security_group_settled(
            self.provider.polling(),
            self.provider.timeouts().security_group_membership,
        )?;
        self.poller()
            .await_state(id, waiters::security_group_membership(group, attached), &spec)
            .await
            .map_err(|e| ProviderError::wait(RESOURCE, id, action, e))?;
        debug!(
            instance_id = %id,
            security_group_id = %group,
            attached,
            "Security group membership settled"
        );
        Ok(())
    }

    /// All security groups on an instance must agree on statefulness.
    pub async fn check_security_group_conflict(
        &self,
        groups: &[SecurityGroupId],
    ) -> Result<(), ProviderError> {
        if groups.len() < 2 {
            return Ok(());
        }

        let mut stateful: Option<bool> = None;
        for group_id in groups {
            let group = self
                .provider
                .client()
                .get_security_group(group_id)
                .await
                .map_err(|e| ProviderError::api("security group", group_id, "read", e))?;
            match stateful {
                None => stateful = Some(group.stateful),
                Some(expected) if expected != group.stateful => {
                    return Err(ProviderError::invalid(
                        RESOURCE,
                        "invalid security_group_ids, all security groups must have the same stateful",
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Default configuration template matching the instance's datastore.
    ///
    /// The last matching template wins; its alternate id is used when set.
    async fn resolve_default_configuration(
        &self,
        id: &RedisInstanceId,
    ) -> Result<RedisConfigurationId, ProviderError> {
        let client = self.provider.client();
        let instance = client
            .get_redis_instance(id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "read", e))?;
        let templates = client
            .list_default_redis_configurations()
            .await
            .map_err(|e| {
                ProviderError::api(RESOURCE, id, "list default configurations for", e)
            })?;

        let template = templates
            .iter()
            .rev()
            .find(|t| {
                t.datastore_name == instance.datastore_name
                    && t.datastore_version == instance.datastore_version
                    && t.datastore_mode == instance.datastore_mode
            })
            .ok_or_else(|| {
                ProviderError::invalid(
                    RESOURCE,
                    format!(
                        "no default configuration template for {} {} ({})",
                        instance.datastore_name, instance.datastore_version, instance.datastore_mode
                    ),
                )
            })?;

        match RedisConfigurationId::parse(&template.alternate_id) {
            Ok(alternate) => Ok(alternate),
            Err(e) if e.is_empty() => Ok(template.id),
            Err(e) => Err(ProviderError::api(
                RESOURCE,
                id,
                "list default configurations for",
                ApiError::Decode {
                    path: "/redis/configurations".to_string(),
                    message: e.to_string(),
                },
            )),
        }
    }

    /// Delete an instance and wait until it is gone.
    pub async fn delete(&self, id: &RedisInstanceId) -> Result<(), ProviderError> {
        self.provider
            .client()
            .delete_redis_instance(id)
            .await
            .map_err(|e| ProviderError::api(RESOURCE, id, "delete", e))?;
        info!(instance_id = %id, "Redis instance deletion accepted");

        let spec = waiters::redis_deleted(
            self.provider.polling(),
            self.provider.timeouts().redis_instance.delete,
        )?;
        self.poller()
            .await_state(id, waiters::redis_job_status, &spec)
            .await
            .map_err(|e| ProviderError::wait(RESOURCE, id, "delete", e))?;
        Ok(())
    }
}
