//! Provider configuration.
//!
//! Loaded from `CMC_*` environment variables. Operation timeouts and poll
//! profiles default to the values the CMC Cloud API is known to need.

use std::time::Duration;

use thiserror::Error;

use crate::logging::LogFormat;

const DEFAULT_API_URL: &str = "https://api.cmccloud.vn/v2";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Provider configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub timeouts: Timeouts,
    pub polling: Polling,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,
}

/// REST endpoint and credentials.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub project_id: String,
    pub region_id: String,
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        project_id: impl Into<String>,
        region_id: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            project_id: project_id.into(),
            region_id: region_id.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Create/update/delete deadlines for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl OperationTimeouts {
    pub const fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            update: timeout,
            delete: timeout,
        }
    }
}

/// Deadlines per resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub kubernetes: OperationTimeouts,
    pub redis_instance: OperationTimeouts,
    pub redis_configuration: OperationTimeouts,
    pub volume_attachment: OperationTimeouts,

    /// Security group attach/detach membership waits.
    pub security_group_membership: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            kubernetes: OperationTimeouts {
                create: minutes(120),
                update: minutes(120),
                delete: minutes(10),
            },
            redis_instance: OperationTimeouts {
                create: minutes(120),
                update: minutes(60),
                delete: minutes(5),
            },
            redis_configuration: OperationTimeouts::uniform(minutes(2)),
            volume_attachment: OperationTimeouts::uniform(minutes(2)),
            security_group_membership: Duration::from_secs(40),
        }
    }
}

/// Initial delay and poll-spacing floor for one family of waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollProfile {
    pub delay: Duration,
    pub min_poll_interval: Duration,
}

impl PollProfile {
    pub const fn new(delay: Duration, min_poll_interval: Duration) -> Self {
        Self {
            delay,
            min_poll_interval,
        }
    }

    const fn secs(delay: u64, min_poll_interval: u64) -> Self {
        Self::new(
            Duration::from_secs(delay),
            Duration::from_secs(min_poll_interval),
        )
    }
}

/// Poll profiles per wait family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polling {
    pub kubernetes_status: PollProfile,
    pub kubernetes_delete: PollProfile,
    pub redis_job: PollProfile,
    pub redis_delete: PollProfile,
    pub redis_configuration_delete: PollProfile,
    pub security_group_membership: PollProfile,
    pub volume_attachment: PollProfile,
}

impl Polling {
    /// Same profile for every wait.
    pub const fn uniform(profile: PollProfile) -> Self {
        Self {
            kubernetes_status: profile,
            kubernetes_delete: profile,
            redis_job: profile,
            redis_delete: profile,
            redis_configuration_delete: profile,
            security_group_membership: profile,
            volume_attachment: profile,
        }
    }
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            kubernetes_status: PollProfile::secs(10, 30),
            kubernetes_delete: PollProfile::secs(20, 180),
            redis_job: PollProfile::secs(10, 20),
            redis_delete: PollProfile::secs(10, 20),
            redis_configuration_delete: PollProfile::secs(10, 30),
            security_group_membership: PollProfile::secs(5, 5),
            volume_attachment: PollProfile::secs(2, 5),
        }
    }
}

impl Config {
    /// Build a configuration with default timeouts and polling.
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            timeouts: Timeouts::default(),
            polling: Polling::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let base_url = lookup("CMC_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_key = required("CMC_API_KEY")?;
        let project_id = required("CMC_PROJECT_ID")?;
        let region_id = required("CMC_REGION_ID")?;

        let request_timeout_secs = match lookup("CMC_REQUEST_TIMEOUT_SECS") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "CMC_REQUEST_TIMEOUT_SECS",
                value,
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let log_level = lookup("CMC_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("CMC_LOG_FORMAT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "CMC_LOG_FORMAT",
                value,
            })?,
            None => LogFormat::Pretty,
        };

        let mut api = ApiConfig::new(base_url, api_key, project_id, region_id);
        api.request_timeout = Duration::from_secs(request_timeout_secs);

        Ok(Self {
            log_level,
            log_format,
            ..Self::new(api)
        })
    }
}

const fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}
