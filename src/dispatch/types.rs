//! Request and response types for the batch endpoint.

use crate::events::Event;
use crate::types::{ClientId, Namespace};
use serde::{Deserialize, Serialize};

/// Validated per-request context, produced by the session/auth middleware
/// chain before the dispatcher runs.
#[derive(Clone, Debug)]
pub struct RequestContext {
    /// Tenant namespace every store call in the batch is scoped to.
    pub namespace: Namespace,

    /// The requesting client, already resolved by the session layer.
    pub client: ClientId,

    /// Verified end-user identity, if the request carried one.
    pub google_user: Option<String>,
}

impl RequestContext {
    pub fn new(namespace: Namespace, client: ClientId) -> Self {
        Self {
            namespace,
            client,
            google_user: None,
        }
    }

    pub fn with_google_user(mut self, user: impl Into<String>) -> Self {
        self.google_user = Some(user.into());
        self
    }
}

/// One command in a batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,

    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            command: command.into(),
            arguments,
        }
    }
}

/// Terminal status of a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Ok,
    Error,
}

/// Outcome of a dispatched batch.
///
/// `responses[i]` corresponds to `commands[i]`. On an aborted batch the
/// responses cover only the commands that executed; their effects are
/// retained.
#[derive(Clone, Debug, Serialize)]
pub struct BatchResponse {
    pub status: BatchStatus,
    pub responses: Vec<serde_json::Value>,
    pub events: Vec<Event>,

    /// Present when the batch aborted early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
