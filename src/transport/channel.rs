//! In-process channels backed by bounded crossbeam queues.

use super::ChannelProvider;
use crate::error::{HubError, Result};
use crate::events::Event;
use crate::types::ClientId;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Opaque push token handed to the client.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelToken(pub String);

impl fmt::Debug for ChannelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelToken({}...)", self.0.get(..8).unwrap_or(&self.0))
    }
}

impl fmt::Display for ChannelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token plus its validity window, returned from `create_channel`.
#[derive(Clone, Debug, Serialize)]
pub struct ChannelGrant {
    pub token: ChannelToken,
    pub duration_seconds: u64,
}

/// Configuration for in-process channels.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// How long an issued token stays valid. The token duration is the only
    /// timeout in the model; on expiry the client must request a new
    /// channel before further pushes can be delivered.
    pub duration: Duration,

    /// Max buffered events per client before pushes are dropped.
    /// Default: 1000
    pub buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(2 * 60 * 60),
            buffer_size: 1000,
        }
    }
}

/// Receiving end of a client's channel.
pub struct ChannelHandle {
    pub client: ClientId,
    receiver: Receiver<Event>,
}

impl ChannelHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> std::result::Result<Event, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> std::result::Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<Event, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

struct ClientChannel {
    token: ChannelToken,
    expires_at: Instant,
    sender: Sender<Event>,
    /// Held until the transport provider claims it with the token.
    receiver: Option<Receiver<Event>>,
}

/// In-process `ChannelProvider`.
pub struct InProcessChannels {
    config: ChannelConfig,
    channels: RwLock<HashMap<ClientId, ClientChannel>>,
    tokens: RwLock<HashMap<ChannelToken, ClientId>>,
}

impl InProcessChannels {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            channels: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Exchange a token for the receiving end of the channel (models the
    /// client opening its push socket with the token). Each grant claims at
    /// most once; unknown, superseded, and expired tokens are rejected.
    pub fn claim(&self, token: &ChannelToken) -> Result<ChannelHandle> {
        let client = self
            .tokens
            .read()
            .get(token)
            .copied()
            .ok_or_else(|| HubError::InvalidToken("unknown token".to_string()))?;

        let mut channels = self.channels.write();
        let channel = channels
            .get_mut(&client)
            .ok_or_else(|| HubError::InvalidToken("channel closed".to_string()))?;
        if channel.token != *token {
            return Err(HubError::InvalidToken("token superseded".to_string()));
        }
        if Instant::now() >= channel.expires_at {
            return Err(HubError::InvalidToken("token expired".to_string()));
        }
        let receiver = channel
            .receiver
            .take()
            .ok_or_else(|| HubError::InvalidToken("token already claimed".to_string()))?;

        Ok(ChannelHandle { client, receiver })
    }
}

impl ChannelProvider for InProcessChannels {
    fn create_channel(&self, client: ClientId) -> ChannelGrant {
        let token = ChannelToken(Uuid::new_v4().to_string());
        let (sender, receiver) = bounded(self.config.buffer_size);

        let mut channels = self.channels.write();
        let replaced = channels.insert(
            client,
            ClientChannel {
                token: token.clone(),
                expires_at: Instant::now() + self.config.duration,
                sender,
                receiver: Some(receiver),
            },
        );
        let mut tokens = self.tokens.write();
        if let Some(old) = replaced {
            tokens.remove(&old.token);
        }
        tokens.insert(token.clone(), client);
        tracing::debug!(client = %client, "channel created");

        ChannelGrant {
            token,
            duration_seconds: self.config.duration.as_secs(),
        }
    }

    fn deliver(&self, client: ClientId, event: Event) -> bool {
        let channels = self.channels.read();
        let Some(channel) = channels.get(&client) else {
            return false;
        };
        if Instant::now() >= channel.expires_at {
            return false;
        }
        channel.sender.try_send(event).is_ok()
    }

    fn close(&self, client: ClientId) {
        let mut channels = self.channels.write();
        if let Some(channel) = channels.remove(&client) {
            self.tokens.write().remove(&channel.token);
        }
    }
}
