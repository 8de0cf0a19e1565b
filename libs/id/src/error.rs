//! Error types for ID parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The ID string is empty.
    #[error("{kind} ID cannot be empty")]
    Empty { kind: &'static str },

    /// The ID is not a UUID.
    #[error("invalid {kind} ID '{value}': {reason}")]
    InvalidUuid {
        kind: &'static str,
        value: String,
        reason: String,
    },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty { .. })
    }

    /// The resource kind the ID was parsed for.
    pub fn kind(&self) -> &'static str {
        match self {
            IdError::Empty { kind } | IdError::InvalidUuid { kind, .. } => kind,
        }
    }
}
