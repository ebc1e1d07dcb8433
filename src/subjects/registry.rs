//! Subject registry: find-or-create topics and point lookup by key.

use crate::subjects::log::SubjectLog;
use crate::types::{Message, MessageKey, Namespace, SubjectId, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A named topic and its message log.
pub struct Subject {
    pub id: SubjectId,
    pub namespace: Namespace,
    pub name: String,
    pub created: Timestamp,
    log: SubjectLog,
}

impl Subject {
    pub fn log(&self) -> &SubjectLog {
        &self.log
    }
}

/// Registry of subjects, keyed by (namespace, name).
pub struct SubjectRegistry {
    by_name: RwLock<HashMap<(Namespace, String), Arc<Subject>>>,

    /// Point-lookup index: (namespace, key) -> stored message.
    by_key: RwLock<HashMap<(Namespace, MessageKey), Message>>,

    next_id: AtomicU64,
}

impl SubjectRegistry {
    pub fn new() -> Self {
        Self {
            by_name: RwLock::new(HashMap::new()),
            by_key: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Find or lazily create the subject named `name`.
    ///
    /// Idempotent under concurrent calls: the double-checked insert
    /// guarantees exactly one `Subject` instance per (namespace, name).
    pub fn find_or_create(&self, namespace: &Namespace, name: &str) -> Arc<Subject> {
        if let Some(subject) = self.by_name.read().get(&(namespace.clone(), name.to_string())) {
            return Arc::clone(subject);
        }

        let mut by_name = self.by_name.write();
        let subject = by_name
            .entry((namespace.clone(), name.to_string()))
            .or_insert_with(|| {
                let id = SubjectId(self.next_id.fetch_add(1, Ordering::SeqCst));
                tracing::debug!(subject = %id, name, "subject created");
                Arc::new(Subject {
                    id,
                    namespace: namespace.clone(),
                    name: name.to_string(),
                    created: Timestamp::now(),
                    log: SubjectLog::new(),
                })
            });
        Arc::clone(subject)
    }

    pub fn get(&self, namespace: &Namespace, name: &str) -> Option<Arc<Subject>> {
        self.by_name
            .read()
            .get(&(namespace.clone(), name.to_string()))
            .cloned()
    }

    /// Point lookup by message key, independent of subject. Unknown keys are
    /// `None`, never an error.
    pub fn get_key(&self, namespace: &Namespace, key: &MessageKey) -> Option<Message> {
        self.by_key
            .read()
            .get(&(namespace.clone(), key.clone()))
            .cloned()
    }

    /// Index a freshly appended message for `get_key`. First write wins.
    pub(crate) fn index_key(&self, namespace: &Namespace, message: &Message) {
        self.by_key
            .write()
            .entry((namespace.clone(), message.key.clone()))
            .or_insert_with(|| message.clone());
    }

    pub fn subject_count(&self) -> usize {
        self.by_name.read().len()
    }
}

impl Default for SubjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageInput, ProfileId};
    use serde_json::json;

    fn ns() -> Namespace {
        Namespace::new("test")
    }

    #[test]
    fn test_find_or_create_returns_same_instance() {
        let registry = SubjectRegistry::new();

        let a = registry.find_or_create(&ns(), "room1");
        let b = registry.find_or_create(&ns(), "room1");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.subject_count(), 1);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let registry = SubjectRegistry::new();

        let a = registry.find_or_create(&Namespace::new("alpha"), "room1");
        let b = registry.find_or_create(&Namespace::new("beta"), "room1");

        assert_ne!(a.id, b.id);
        assert_eq!(registry.subject_count(), 2);
    }

    #[test]
    fn test_get_key_roundtrip_and_miss() {
        let registry = SubjectRegistry::new();
        let subject = registry.find_or_create(&ns(), "room1");

        let outcome = subject.log().append(
            subject.id,
            &subject.name,
            MessageInput::new(ProfileId(1), json!("hello")).with_key(MessageKey::new("k1")),
        );
        registry.index_key(&ns(), outcome.message());

        let found = registry.get_key(&ns(), &MessageKey::new("k1")).unwrap();
        assert_eq!(found.payload, json!("hello"));

        assert!(registry.get_key(&ns(), &MessageKey::new("unused")).is_none());
        // Keys are namespace-scoped.
        assert!(registry
            .get_key(&Namespace::new("other"), &MessageKey::new("k1"))
            .is_none());
    }
}
