//! Registry of profiles and their clients.

use crate::error::{HubError, Result};
use crate::types::{ClientId, Namespace, ProfileId, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// An end-user identity, anonymous or verified.
#[derive(Debug)]
pub struct Profile {
    pub id: ProfileId,

    /// Verified Google account, if the session layer established one.
    pub google_user: Option<String>,

    pub created: Timestamp,
}

/// One connection endpoint, child of exactly one profile.
///
/// The `channel_active` flag is the transport's view of the client: flipped
/// by connect/disconnect callbacks, read by fan-out. It is atomic because
/// lifecycle callbacks race freely with command batches; last write wins.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub profile: ProfileId,
    pub namespace: Namespace,
    channel_active: AtomicBool,
}

impl Client {
    /// Whether the transport currently reports this client connected.
    pub fn channel_active(&self) -> bool {
        self.channel_active.load(Ordering::SeqCst)
    }

    fn set_channel_active(&self, active: bool) {
        self.channel_active.store(active, Ordering::SeqCst);
    }
}

/// Registry of profiles and clients.
pub struct ClientRegistry {
    profiles: RwLock<HashMap<ProfileId, Arc<Profile>>>,
    clients: RwLock<HashMap<ClientId, Arc<Client>>>,
    next_profile_id: AtomicU64,
    next_client_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
            clients: RwLock::new(HashMap::new()),
            next_profile_id: AtomicU64::new(1),
            next_client_id: AtomicU64::new(1),
        }
    }

    /// Create a profile.
    pub fn create_profile(&self, google_user: Option<String>) -> Arc<Profile> {
        let id = ProfileId(self.next_profile_id.fetch_add(1, Ordering::SeqCst));
        let profile = Arc::new(Profile {
            id,
            google_user,
            created: Timestamp::now(),
        });
        self.profiles.write().insert(id, Arc::clone(&profile));
        tracing::debug!(profile = %id, "profile created");
        profile
    }

    /// Create a client owned by `profile`, scoped to `namespace`.
    ///
    /// New clients start disconnected.
    pub fn create_client(&self, namespace: Namespace, profile: ProfileId) -> Result<Arc<Client>> {
        if !self.profiles.read().contains_key(&profile) {
            return Err(HubError::ProfileNotFound(profile));
        }

        let id = ClientId(self.next_client_id.fetch_add(1, Ordering::SeqCst));
        let client = Arc::new(Client {
            id,
            profile,
            namespace,
            channel_active: AtomicBool::new(false),
        });
        self.clients.write().insert(id, Arc::clone(&client));
        tracing::debug!(client = %id, profile = %profile, "client created");
        Ok(client)
    }

    pub fn get(&self, id: ClientId) -> Option<Arc<Client>> {
        self.clients.read().get(&id).cloned()
    }

    pub fn profile(&self, id: ProfileId) -> Option<Arc<Profile>> {
        self.profiles.read().get(&id).cloned()
    }

    /// Flip the connected flag on. Returns false for unknown clients so the
    /// transport callback stays a no-op.
    pub fn mark_connected(&self, id: ClientId) -> bool {
        match self.clients.read().get(&id) {
            Some(client) => {
                client.set_channel_active(true);
                true
            }
            None => false,
        }
    }

    /// Flip the connected flag off. Returns false for unknown clients.
    pub fn mark_disconnected(&self, id: ClientId) -> bool {
        match self.clients.read().get(&id) {
            Some(client) => {
                client.set_channel_active(false);
                true
            }
            None => false,
        }
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_profile_and_client() {
        let registry = ClientRegistry::new();

        let profile = registry.create_profile(Some("user@example.com".to_string()));
        let client = registry
            .create_client(Namespace::new("test"), profile.id)
            .unwrap();

        assert_eq!(client.profile, profile.id);
        assert!(!client.channel_active());
        assert_eq!(registry.profile_count(), 1);
        assert_eq!(registry.client_count(), 1);
    }

    #[test]
    fn test_create_client_unknown_profile() {
        let registry = ClientRegistry::new();

        let result = registry.create_client(Namespace::new("test"), ProfileId(42));
        assert!(matches!(result, Err(HubError::ProfileNotFound(_))));
    }

    #[test]
    fn test_connect_disconnect_flag() {
        let registry = ClientRegistry::new();
        let profile = registry.create_profile(None);
        let client = registry
            .create_client(Namespace::new("test"), profile.id)
            .unwrap();

        assert!(registry.mark_connected(client.id));
        assert!(client.channel_active());

        assert!(registry.mark_disconnected(client.id));
        assert!(!client.channel_active());
    }

    #[test]
    fn test_lifecycle_for_unknown_client_is_noop() {
        let registry = ClientRegistry::new();

        assert!(!registry.mark_connected(ClientId(99)));
        assert!(!registry.mark_disconnected(ClientId(99)));
    }
}
