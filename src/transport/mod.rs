//! Push-delivery transport.
//!
//! The platform push channel sits behind the `ChannelProvider` capability
//! so any server-push mechanism (persistent socket, event stream,
//! long-poll) can carry events. `InProcessChannels` is the built-in
//! implementation used by tests and single-process embeddings.
//!
//! Connection lifecycle (`on_connect` / `on_disconnect`) lives on the hub,
//! driven by the transport provider; the provider here only issues tokens
//! and moves events.

mod channel;

pub use channel::{ChannelConfig, ChannelGrant, ChannelHandle, ChannelToken, InProcessChannels};

use crate::events::Event;
use crate::types::ClientId;

/// Capability interface for issuing push tokens and delivering events.
pub trait ChannelProvider: Send + Sync {
    /// Issue a fresh push token for `client`, valid for the configured
    /// duration. Re-callable at any time; each call replaces the client's
    /// previous channel.
    fn create_channel(&self, client: ClientId) -> ChannelGrant;

    /// Best-effort delivery of one event. Returns false when the event was
    /// dropped (no channel, expired token, or full buffer).
    fn deliver(&self, client: ClientId, event: Event) -> bool;

    /// Tear down any channel state held for `client`.
    fn close(&self, client: ClientId);
}
