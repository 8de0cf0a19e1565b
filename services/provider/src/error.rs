//! Provider error types.

use cmccloud_converge::{BoxError, FetchError, WaitSpecError};
use thiserror::Error;

/// Errors returned by the REST client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("resource not found: {path}")]
    NotFound { path: String },

    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Create an API error from response details.
    pub fn api(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound { .. } => FetchError::NotFound,
            other => FetchError::remote(other),
        }
    }
}

/// A resource operation failed.
///
/// Messages name the resource kind, its id and the attempted action.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A remote call was rejected or could not be made.
    #[error("failed to {action} {resource} {id}: {source}")]
    Api {
        resource: &'static str,
        id: String,
        action: &'static str,
        #[source]
        source: ApiError,
    },

    /// The remote accepted the call but the resource did not converge.
    #[error("failed to {action} {resource} {id}: {source}")]
    Wait {
        resource: &'static str,
        id: String,
        action: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("invalid {resource}: {message}")]
    Invalid {
        resource: &'static str,
        message: String,
    },

    #[error("{resource} {id} has no node group named '{name}'")]
    MissingNodeGroup {
        resource: &'static str,
        id: String,
        name: String,
    },

    #[error("invalid wait configuration: {0}")]
    WaitSpec(#[from] WaitSpecError),

    #[error("failed to create API client: {0}")]
    Client(#[source] ApiError),
}

impl ProviderError {
    pub fn api(
        resource: &'static str,
        id: impl ToString,
        action: &'static str,
        source: ApiError,
    ) -> Self {
        Self::Api {
            resource,
            id: id.to_string(),
            action,
            source,
        }
    }

    pub fn wait(
        resource: &'static str,
        id: impl ToString,
        action: &'static str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Wait {
            resource,
            id: id.to_string(),
            action,
            source: source.into(),
        }
    }

    pub fn invalid(resource: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            resource,
            message: message.into(),
        }
    }

    /// Returns true if the remote resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { source, .. } if source.is_not_found())
    }
}
