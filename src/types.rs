//! Core types for the pub/sub hub.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Tenant namespace. Every registry lookup is scoped to exactly one namespace.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace(pub String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Namespace(name.into())
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.0)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a profile (end-user identity).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(pub u64);

impl fmt::Debug for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProfileId({})", self.0)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a client (one connection endpoint).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientId({})", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a subject (named topic).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub u64);

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({})", self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a message within its subject's log (monotonic, assigned).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct MessageId(pub u64);

impl MessageId {
    pub fn next(self) -> Self {
        MessageId(self.0 + 1)
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque point-lookup key for a message.
///
/// Caller-supplied keys double as retry deduplication handles; generated
/// keys are random and globally unique.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageKey(pub String);

impl MessageKey {
    pub fn new(key: impl Into<String>) -> Self {
        MessageKey(key.into())
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        MessageKey(Uuid::new_v4().to_string())
    }
}

impl fmt::Debug for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageKey({})", self.0)
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A message stored in a subject's log.
///
/// Immutable once stored. The id is the per-subject creation order; the key
/// is the global point-lookup handle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Position in the subject's log (assigned by the log).
    pub id: MessageId,

    /// Point-lookup key (caller-supplied or generated).
    pub key: MessageKey,

    /// Which subject this message belongs to.
    pub subject: SubjectId,

    /// The subject's name, carried for event construction.
    pub subject_name: String,

    /// Publishing profile.
    pub sender: ProfileId,

    /// When the message was stored.
    pub created: Timestamp,

    /// Application-defined payload.
    pub payload: serde_json::Value,
}

/// Input for publishing a message (before id/key assignment).
#[derive(Clone, Debug)]
pub struct MessageInput {
    pub sender: ProfileId,
    pub payload: serde_json::Value,
    pub explicit_key: Option<MessageKey>,
}

impl MessageInput {
    pub fn new(sender: ProfileId, payload: serde_json::Value) -> Self {
        Self {
            sender,
            payload,
            explicit_key: None,
        }
    }

    /// Use a caller-controlled key (e.g. for retry deduplication).
    pub fn with_key(mut self, key: MessageKey) -> Self {
        self.explicit_key = Some(key);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_navigation() {
        let id = MessageId(5);
        assert_eq!(id.next(), MessageId(6));
        assert_eq!(MessageId::default(), MessageId(0));
    }

    #[test]
    fn test_generated_keys_are_unique() {
        let a = MessageKey::generate();
        let b = MessageKey::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_message_input_builder() {
        let input = MessageInput::new(ProfileId(1), serde_json::json!("hi"))
            .with_key(MessageKey::new("k1"));
        assert_eq!(input.explicit_key, Some(MessageKey::new("k1")));
    }
}
