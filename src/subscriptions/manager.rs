//! Subscription manager: interest bindings, replay, and fan-out.

use crate::clients::ClientRegistry;
use crate::events::Event;
use crate::subjects::Subject;
use crate::transport::ChannelProvider;
use crate::types::{ClientId, Message, MessageId, SubjectId, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;

/// What a fresh subscriber wants replayed from the subject's history.
#[derive(Clone, Copy, Debug)]
pub enum ReplayRequest {
    /// The `n` most recent messages, oldest-first.
    Recent(usize),

    /// Everything after a previously seen message id (reconnect resume).
    Since(MessageId),
}

impl ReplayRequest {
    /// Live-only subscription, no history.
    pub fn none() -> Self {
        ReplayRequest::Recent(0)
    }
}

/// A durable interest binding between one client and one subject.
#[derive(Clone, Debug)]
pub struct Subscription {
    pub subject: SubjectId,
    pub client: ClientId,
    pub created: Timestamp,
}

/// Manages subscriptions and scatters published messages to subscribers.
pub struct SubscriptionManager {
    subscriptions: RwLock<HashMap<(SubjectId, ClientId), Subscription>>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or reuse) the binding for (subject, client) and compute the
    /// replay batch, oldest-first.
    ///
    /// Idempotent: a repeat subscribe never duplicates the binding, and the
    /// replay is computed fresh on every call.
    pub fn find_or_create(
        &self,
        subject: &Subject,
        client: ClientId,
        replay: ReplayRequest,
    ) -> Vec<Message> {
        {
            let mut subs = self.subscriptions.write();
            subs.entry((subject.id, client)).or_insert_with(|| {
                tracing::debug!(subject = %subject.id, client = %client, "subscription created");
                Subscription {
                    subject: subject.id,
                    client,
                    created: Timestamp::now(),
                }
            });
        }

        match replay {
            ReplayRequest::Recent(0) => Vec::new(),
            ReplayRequest::Recent(n) => subject.log().recent(n),
            ReplayRequest::Since(last_id) => subject.log().since(last_id),
        }
    }

    /// Delete the binding if present. Absent is a no-op, not an error.
    pub fn remove(&self, subject: SubjectId, client: ClientId) -> bool {
        let removed = self
            .subscriptions
            .write()
            .remove(&(subject, client))
            .is_some();
        if removed {
            tracing::debug!(subject = %subject, client = %client, "subscription removed");
        }
        removed
    }

    /// Delete every subscription owned by `client` (disconnect cleanup).
    /// Returns how many were dropped.
    pub fn remove_client(&self, client: ClientId) -> usize {
        let mut subs = self.subscriptions.write();
        let before = subs.len();
        subs.retain(|_, sub| sub.client != client);
        let dropped = before - subs.len();
        if dropped > 0 {
            tracing::debug!(client = %client, dropped, "subscriptions dropped");
        }
        dropped
    }

    pub fn is_subscribed(&self, subject: SubjectId, client: ClientId) -> bool {
        self.subscriptions.read().contains_key(&(subject, client))
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Scatter a freshly appended message to every subscriber on its
    /// subject whose client holds an active channel.
    ///
    /// Best effort: disconnected clients are skipped and undeliverable
    /// pushes are dropped. Returns the delivered count; the publisher never
    /// blocks on delivery.
    pub fn fan_out(
        &self,
        message: &Message,
        clients: &ClientRegistry,
        channels: &dyn ChannelProvider,
    ) -> usize {
        let targets: Vec<ClientId> = {
            let subs = self.subscriptions.read();
            subs.values()
                .filter(|sub| sub.subject == message.subject)
                .map(|sub| sub.client)
                .collect()
        };

        let mut delivered = 0;
        for client_id in targets {
            let Some(client) = clients.get(client_id) else {
                continue;
            };
            if !client.channel_active() {
                continue;
            }
            if channels.deliver(client_id, Event::message(message)) {
                delivered += 1;
            } else {
                tracing::warn!(client = %client_id, subject = %message.subject, "push dropped");
            }
        }
        delivered
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subjects::SubjectRegistry;
    use crate::transport::{ChannelConfig, InProcessChannels};
    use crate::types::{MessageInput, Namespace, ProfileId};
    use serde_json::json;
    use std::time::Duration;

    fn test_subject(registry: &SubjectRegistry, messages: usize) -> std::sync::Arc<Subject> {
        let subject = registry.find_or_create(&Namespace::new("test"), "room1");
        for i in 0..messages {
            subject.log().append(
                subject.id,
                &subject.name,
                MessageInput::new(ProfileId(1), json!(i)),
            );
        }
        subject
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let registry = SubjectRegistry::new();
        let subject = test_subject(&registry, 0);
        let manager = SubscriptionManager::new();

        manager.find_or_create(&subject, ClientId(1), ReplayRequest::none());
        manager.find_or_create(&subject, ClientId(1), ReplayRequest::none());

        assert_eq!(manager.subscription_count(), 1);
        assert!(manager.is_subscribed(subject.id, ClientId(1)));
    }

    #[test]
    fn test_replay_recomputed_on_repeat_subscribe() {
        let registry = SubjectRegistry::new();
        let subject = test_subject(&registry, 3);
        let manager = SubscriptionManager::new();

        let first = manager.find_or_create(&subject, ClientId(1), ReplayRequest::Recent(2));
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, MessageId(2));

        subject.log().append(
            subject.id,
            &subject.name,
            MessageInput::new(ProfileId(1), json!("new")),
        );

        let second = manager.find_or_create(&subject, ClientId(1), ReplayRequest::Recent(2));
        assert_eq!(second[1].id, MessageId(4));
    }

    #[test]
    fn test_replay_since_last_id() {
        let registry = SubjectRegistry::new();
        let subject = test_subject(&registry, 5);
        let manager = SubscriptionManager::new();

        let resumed = manager.find_or_create(&subject, ClientId(1), ReplayRequest::Since(MessageId(3)));
        assert_eq!(resumed.len(), 2);
        assert_eq!(resumed[0].id, MessageId(4));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let manager = SubscriptionManager::new();
        assert!(!manager.remove(SubjectId(1), ClientId(1)));
    }

    #[test]
    fn test_remove_client_drops_all_bindings() {
        let registry = SubjectRegistry::new();
        let a = registry.find_or_create(&Namespace::new("test"), "a");
        let b = registry.find_or_create(&Namespace::new("test"), "b");
        let manager = SubscriptionManager::new();

        manager.find_or_create(&a, ClientId(1), ReplayRequest::none());
        manager.find_or_create(&b, ClientId(1), ReplayRequest::none());
        manager.find_or_create(&a, ClientId(2), ReplayRequest::none());

        assert_eq!(manager.remove_client(ClientId(1)), 2);
        assert_eq!(manager.subscription_count(), 1);
        assert!(manager.is_subscribed(a.id, ClientId(2)));
    }

    #[test]
    fn test_fan_out_skips_inactive_clients() {
        let clients = ClientRegistry::new();
        let profile = clients.create_profile(None);
        let connected = clients
            .create_client(Namespace::new("test"), profile.id)
            .unwrap();
        let disconnected = clients
            .create_client(Namespace::new("test"), profile.id)
            .unwrap();

        let channels = InProcessChannels::new(ChannelConfig {
            duration: Duration::from_secs(60),
            buffer_size: 8,
        });
        let connected_grant = channels.create_channel(connected.id);
        channels.create_channel(disconnected.id);
        let handle = channels.claim(&connected_grant.token).unwrap();
        clients.mark_connected(connected.id);

        let registry = SubjectRegistry::new();
        let subject = test_subject(&registry, 0);
        let manager = SubscriptionManager::new();
        manager.find_or_create(&subject, connected.id, ReplayRequest::none());
        manager.find_or_create(&subject, disconnected.id, ReplayRequest::none());

        let outcome = subject.log().append(
            subject.id,
            &subject.name,
            MessageInput::new(profile.id, json!("ping")),
        );
        let delivered = manager.fan_out(outcome.message(), &clients, &channels);

        assert_eq!(delivered, 1);
        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        assert!(matches!(event, Event::Message { .. }));
    }
}
