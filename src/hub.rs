//! Main Hub struct tying all components together.

use crate::clients::{Client, ClientRegistry, Profile};
use crate::dispatch::{self, BatchResponse, CommandRequest, RequestContext};
use crate::error::{HubError, Result};
use crate::events::Event;
use crate::subjects::{AppendOutcome, SubjectRegistry};
use crate::subscriptions::{ReplayRequest, SubscriptionManager};
use crate::transport::{ChannelConfig, ChannelGrant, ChannelProvider, InProcessChannels};
use crate::types::{ClientId, Message, MessageInput, MessageKey, Namespace, ProfileId};
use std::sync::Arc;
use std::time::Duration;

/// Hub configuration.
#[derive(Clone, Debug)]
pub struct HubConfig {
    /// Validity window for issued push tokens.
    pub channel_duration: Duration,

    /// Max buffered events per client channel.
    pub channel_buffer_size: usize,

    /// Upper bound honored for replay-on-subscribe requests.
    pub max_replay: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            channel_duration: Duration::from_secs(2 * 60 * 60),
            channel_buffer_size: 1000,
            max_replay: 1000,
        }
    }
}

/// Entity counts snapshot.
#[derive(Clone, Debug, Default)]
pub struct HubStats {
    pub profile_count: usize,
    pub client_count: usize,
    pub subject_count: usize,
    pub subscription_count: usize,
}

/// The pub/sub hub.
///
/// Provides a unified interface for:
/// - Publishing messages to subjects and fanning them out to subscribers
/// - Subscribing with replay of recent history or resume from a known id
/// - Issuing push tokens and reacting to transport lifecycle callbacks
/// - Dispatching ordered command batches with event hoisting
///
/// Two mutation paths touch the same entities: command batches (sequential
/// per client, concurrent across clients) and transport callbacks
/// (asynchronous). Every entity guards its own state, so concurrent
/// updates to different entities proceed independently; there is no global
/// lock.
pub struct Hub {
    config: HubConfig,
    clients: ClientRegistry,
    subjects: SubjectRegistry,
    subscriptions: SubscriptionManager,
    channels: Arc<dyn ChannelProvider>,
}

impl Hub {
    /// Create a hub with the built-in in-process transport.
    pub fn new(config: HubConfig) -> Self {
        let channels = Arc::new(InProcessChannels::new(ChannelConfig {
            duration: config.channel_duration,
            buffer_size: config.channel_buffer_size,
        }));
        Self::with_transport(config, channels)
    }

    /// Create a hub with a custom push transport.
    pub fn with_transport(config: HubConfig, channels: Arc<dyn ChannelProvider>) -> Self {
        Self {
            config,
            clients: ClientRegistry::new(),
            subjects: SubjectRegistry::new(),
            subscriptions: SubscriptionManager::new(),
            channels,
        }
    }

    // --- Session surface ---

    /// Create a profile. Called by the session collaborator on first
    /// login or anonymous-session creation.
    pub fn create_profile(&self, google_user: Option<String>) -> Arc<Profile> {
        self.clients.create_profile(google_user)
    }

    /// Create a client owned by `profile`, scoped to `namespace`.
    pub fn create_client(&self, namespace: Namespace, profile: ProfileId) -> Result<Arc<Client>> {
        self.clients.create_client(namespace, profile)
    }

    // --- Commands ---

    /// Issue a push token for `client`, plus the login/logout event
    /// describing the requesting identity.
    pub fn create_channel(
        &self,
        client: ClientId,
        google_user: Option<&str>,
    ) -> Result<(ChannelGrant, Vec<Event>)> {
        let client = self
            .clients
            .get(client)
            .ok_or(HubError::ClientNotFound(client))?;
        let grant = self.channels.create_channel(client.id);

        let event = match google_user {
            Some(user) => Event::Login {
                profile: client.profile,
                google_user: user.to_string(),
            },
            None => Event::Logout {
                profile: client.profile,
            },
        };

        Ok((grant, vec![event]))
    }

    /// Publish a message to a subject, creating the subject if needed.
    ///
    /// Returns once the message is appended; fan-out to subscribers is
    /// best-effort and never blocks on delivery. A duplicate explicit key
    /// makes the send a no-op with no second fan-out.
    pub fn send_message(
        &self,
        namespace: &Namespace,
        subject_name: &str,
        client: ClientId,
        payload: serde_json::Value,
        key: Option<MessageKey>,
    ) -> Result<()> {
        let client = self
            .clients
            .get(client)
            .ok_or(HubError::ClientNotFound(client))?;
        let subject = self.subjects.find_or_create(namespace, subject_name);

        let mut input = MessageInput::new(client.profile, payload);
        if let Some(key) = key {
            input = input.with_key(key);
        }

        match subject.log().append(subject.id, &subject.name, input) {
            AppendOutcome::Appended(message) => {
                self.subjects.index_key(namespace, &message);
                let delivered =
                    self.subscriptions
                        .fan_out(&message, &self.clients, self.channels.as_ref());
                tracing::debug!(subject = %subject.id, id = %message.id, delivered, "message published");
            }
            AppendOutcome::Duplicate(message) => {
                tracing::debug!(subject = %subject.id, id = %message.id, "duplicate key, send skipped");
            }
        }

        Ok(())
    }

    /// Subscribe `client` to a subject, returning the replay batch
    /// oldest-first. Re-subscribing is idempotent; the replay is computed
    /// fresh each time.
    pub fn subscribe(
        &self,
        namespace: &Namespace,
        subject_name: &str,
        client: ClientId,
        replay: ReplayRequest,
    ) -> Result<Vec<Message>> {
        if self.clients.get(client).is_none() {
            return Err(HubError::ClientNotFound(client));
        }
        let subject = self.subjects.find_or_create(namespace, subject_name);

        let replay = match replay {
            ReplayRequest::Recent(n) => ReplayRequest::Recent(n.min(self.config.max_replay)),
            other => other,
        };

        Ok(self.subscriptions.find_or_create(&subject, client, replay))
    }

    /// Drop the subscription if present; absent is a no-op.
    pub fn unsubscribe(
        &self,
        namespace: &Namespace,
        subject_name: &str,
        client: ClientId,
    ) -> Result<()> {
        let subject = self.subjects.find_or_create(namespace, subject_name);
        self.subscriptions.remove(subject.id, client);
        Ok(())
    }

    /// Point lookup of a message by key. Unknown keys are `None`.
    pub fn get_key(&self, namespace: &Namespace, key: &MessageKey) -> Option<Message> {
        self.subjects.get_key(namespace, key)
    }

    // --- Transport lifecycle ---

    /// The transport reports the client's push socket open. Unknown
    /// clients are a no-op.
    pub fn on_connect(&self, client: ClientId) {
        if self.clients.mark_connected(client) {
            tracing::debug!(client = %client, "client connected");
        }
    }

    /// The transport reports the client's push socket closed. Flips the
    /// flag and deletes every subscription owned by the client, so a
    /// disconnected client is never a fan-out target. Unknown clients are
    /// a no-op.
    pub fn on_disconnect(&self, client: ClientId) {
        if self.clients.mark_disconnected(client) {
            let dropped = self.subscriptions.remove_client(client);
            tracing::debug!(client = %client, dropped, "client disconnected");
        }
    }

    // --- Batch dispatch ---

    /// Execute an ordered command batch for one client.
    pub fn dispatch(&self, ctx: &RequestContext, commands: &[CommandRequest]) -> BatchResponse {
        dispatch::run_batch(self, ctx, commands)
    }

    // --- Accessors ---

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn subjects(&self) -> &SubjectRegistry {
        &self.subjects
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn channels(&self) -> &Arc<dyn ChannelProvider> {
        &self.channels
    }

    /// Entity counts.
    pub fn stats(&self) -> HubStats {
        HubStats {
            profile_count: self.clients.profile_count(),
            client_count: self.clients.client_count(),
            subject_count: self.subjects.subject_count(),
            subscription_count: self.subscriptions.subscription_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_hub() -> (Hub, ClientId, Namespace) {
        let hub = Hub::new(HubConfig::default());
        let profile = hub.create_profile(None);
        let ns = Namespace::new("test");
        let client = hub.create_client(ns.clone(), profile.id).unwrap();
        (hub, client.id, ns)
    }

    #[test]
    fn test_create_channel_unknown_client() {
        let hub = Hub::new(HubConfig::default());
        let result = hub.create_channel(ClientId(42), None);
        assert!(matches!(result, Err(HubError::ClientNotFound(_))));
    }

    #[test]
    fn test_create_channel_events() {
        let (hub, client, _) = test_hub();

        let (_, events) = hub.create_channel(client, Some("user@example.com")).unwrap();
        assert!(matches!(events.as_slice(), [Event::Login { .. }]));

        let (_, events) = hub.create_channel(client, None).unwrap();
        assert!(matches!(events.as_slice(), [Event::Logout { .. }]));
    }

    #[test]
    fn test_send_without_subscribers_succeeds() {
        let (hub, client, ns) = test_hub();

        hub.send_message(&ns, "s", client, json!("m"), None).unwrap();
        assert_eq!(hub.subjects().get(&ns, "s").unwrap().log().len(), 1);
    }

    #[test]
    fn test_duplicate_key_send_is_noop() {
        let (hub, client, ns) = test_hub();
        let key = MessageKey::new("k1");

        hub.send_message(&ns, "s", client, json!("a"), Some(key.clone()))
            .unwrap();
        hub.send_message(&ns, "s", client, json!("b"), Some(key.clone()))
            .unwrap();

        assert_eq!(hub.subjects().get(&ns, "s").unwrap().log().len(), 1);
        assert_eq!(hub.get_key(&ns, &key).unwrap().payload, json!("a"));
    }

    #[test]
    fn test_replay_clamped_to_max() {
        let hub = Hub::new(HubConfig {
            max_replay: 2,
            ..Default::default()
        });
        let profile = hub.create_profile(None);
        let ns = Namespace::new("test");
        let client = hub.create_client(ns.clone(), profile.id).unwrap();

        for i in 0..5 {
            hub.send_message(&ns, "s", client.id, json!(i), None).unwrap();
        }

        let replay = hub
            .subscribe(&ns, "s", client.id, ReplayRequest::Recent(100))
            .unwrap();
        assert_eq!(replay.len(), 2);
    }

    #[test]
    fn test_stats_snapshot() {
        let (hub, client, ns) = test_hub();
        hub.subscribe(&ns, "s", client, ReplayRequest::none()).unwrap();

        let stats = hub.stats();
        assert_eq!(stats.profile_count, 1);
        assert_eq!(stats.client_count, 1);
        assert_eq!(stats.subject_count, 1);
        assert_eq!(stats.subscription_count, 1);
    }
}
