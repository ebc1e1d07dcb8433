//! Error types for the pub/sub hub.

use crate::types::{ClientId, ProfileId};
use thiserror::Error;

/// Main error type for hub operations.
///
/// Lookups that can legitimately miss (key lookup, removing an absent
/// subscription, lifecycle callbacks for unknown clients) are not errors;
/// they return `None` or no-op instead.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument for {command}: {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },

    #[error("Profile not found: {0}")]
    ProfileNotFound(ProfileId),

    #[error("Client not found: {0}")]
    ClientNotFound(ClientId),

    #[error("Invalid channel token: {0}")]
    InvalidToken(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for HubError {
    fn from(e: serde_json::Error) -> Self {
        HubError::Serialization(e.to_string())
    }
}

/// Result type for hub operations.
pub type Result<T> = std::result::Result<T, HubError>;
