//! Events delivered outside the direct command response.

use crate::types::{Message, MessageId, MessageKey, ProfileId, Timestamp};
use serde::{Deserialize, Serialize};

/// A push event, delivered over a client's channel or hoisted into the
/// top-level event stream of a command batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Event {
    /// A message arrived on a subscribed subject.
    Message {
        id: MessageId,
        key: MessageKey,
        subject: String,
        sender: ProfileId,
        created: Timestamp,
        message: serde_json::Value,
    },

    /// The requesting profile holds a verified identity.
    Login {
        profile: ProfileId,
        google_user: String,
    },

    /// The requesting profile is anonymous.
    Logout { profile: ProfileId },
}

impl Event {
    /// Build a message event from a stored message.
    pub fn message(message: &Message) -> Self {
        Event::Message {
            id: message.id,
            key: message.key.clone(),
            subject: message.subject_name.clone(),
            sender: message.sender,
            created: message.created,
            message: message.payload.clone(),
        }
    }
}
