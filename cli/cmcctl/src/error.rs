//! Error display for the CLI.

use cmccloud_provider::config::ConfigError;
use cmccloud_provider::{ApiError, ProviderError};
use colored::Colorize;

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(ConfigError::Missing(_)) = err.downcast_ref::<ConfigError>() {
        return Some("Set the variable or pass --api-key, --project and --region.");
    }

    match err.downcast_ref::<ProviderError>()? {
        ProviderError::Api { source, .. } | ProviderError::Client(source) => api_hint(source),
        ProviderError::Wait { .. } => {
            Some("The remote operation may still be running. Check it with `get` before retrying.")
        }
        ProviderError::MissingNodeGroup { .. } => {
            Some("Worker pool changes apply to the 'default-worker' node group only.")
        }
        _ => None,
    }
}

fn api_hint(err: &ApiError) -> Option<&'static str> {
    match err {
        ApiError::Api { status: 401, .. } => Some("Check CMC_API_KEY or --api-key."),
        ApiError::Api { status: 403, .. } => {
            Some("The API key may not have access to this project or region.")
        }
        ApiError::NotFound { .. } => Some("Check the resource ID, --project and --region."),
        ApiError::Network(_) => Some("Check your network connection and --api-url."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_for_missing_config() {
        let err = anyhow::Error::from(ConfigError::Missing("CMC_API_KEY"));
        assert!(hint(&err).unwrap().contains("--api-key"));
    }

    #[test]
    fn test_hint_for_unauthorized() {
        let err = anyhow::Error::from(ProviderError::api(
            "volume",
            "vol-1",
            "attach",
            ApiError::api(401, "unauthorized", "bad key"),
        ));
        assert_eq!(hint(&err), Some("Check CMC_API_KEY or --api-key."));
    }

    #[test]
    fn test_hint_survives_context() {
        let err = anyhow::Error::from(ProviderError::MissingNodeGroup {
            resource: "kubernetes cluster",
            id: "c-1".to_string(),
            name: "default-worker".to_string(),
        })
        .context("scale failed");
        assert!(hint(&err).unwrap().contains("default-worker"));
    }

    #[test]
    fn test_no_hint_for_validation() {
        let err = anyhow::Error::from(ProviderError::invalid("volume", "bad"));
        assert_eq!(hint(&err), None);
    }
}
