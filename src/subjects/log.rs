//! Append-only per-subject message log.

use crate::types::{Message, MessageId, MessageInput, MessageKey, SubjectId, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Outcome of an append.
#[derive(Clone, Debug)]
pub enum AppendOutcome {
    /// The message was appended to the log.
    Appended(Message),

    /// The explicit key was already present; nothing was written and the
    /// stored message is returned.
    Duplicate(Message),
}

impl AppendOutcome {
    pub fn message(&self) -> &Message {
        match self {
            AppendOutcome::Appended(m) | AppendOutcome::Duplicate(m) => m,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, AppendOutcome::Duplicate(_))
    }
}

struct LogState {
    messages: Vec<Message>,
    /// Key -> index into `messages`, for duplicate detection.
    by_key: HashMap<MessageKey, usize>,
    next_id: u64,
}

/// Append-only message log for a single subject.
///
/// Ids are assigned under the log's write lock, so id order and creation
/// order always agree. A duplicate explicit key makes the append a no-op;
/// the caller must not fan out a duplicate.
pub struct SubjectLog {
    state: RwLock<LogState>,
}

impl SubjectLog {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LogState {
                messages: Vec::new(),
                by_key: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Append a message, assigning the next id and (if none was supplied) a
    /// generated key.
    pub fn append(
        &self,
        subject: SubjectId,
        subject_name: &str,
        input: MessageInput,
    ) -> AppendOutcome {
        let mut state = self.state.write();

        if let Some(ref key) = input.explicit_key {
            if let Some(&idx) = state.by_key.get(key) {
                return AppendOutcome::Duplicate(state.messages[idx].clone());
            }
        }

        let id = MessageId(state.next_id);
        state.next_id += 1;
        let key = input.explicit_key.unwrap_or_else(MessageKey::generate);

        let message = Message {
            id,
            key: key.clone(),
            subject,
            subject_name: subject_name.to_string(),
            sender: input.sender,
            created: Timestamp::now(),
            payload: input.payload,
        };

        let idx = state.messages.len();
        state.messages.push(message.clone());
        state.by_key.insert(key, idx);

        AppendOutcome::Appended(message)
    }

    /// The `count` most recent messages, oldest-first.
    pub fn recent(&self, count: usize) -> Vec<Message> {
        let state = self.state.read();
        let skip = state.messages.len().saturating_sub(count);
        state.messages[skip..].to_vec()
    }

    /// Every message with an id strictly greater than `last_id`,
    /// oldest-first (reconnect resume).
    pub fn since(&self, last_id: MessageId) -> Vec<Message> {
        let state = self.state.read();
        state
            .messages
            .iter()
            .filter(|m| m.id > last_id)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: MessageId) -> Option<Message> {
        let state = self.state.read();
        state.messages.iter().find(|m| m.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().messages.is_empty()
    }
}

impl Default for SubjectLog {
    fn default() -> Self {
        Self::new()
    }
}
