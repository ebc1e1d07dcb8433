//! # Courier
//!
//! A real-time publish/subscribe hub: clients subscribe to named subjects
//! and receive push-delivered messages, with replay of recent history and
//! resume from a known point after reconnect.
//!
//! ## Core Concepts
//!
//! - **Subjects**: named topics, created lazily on first use
//! - **Messages**: append-only per-subject logs with monotonic ids
//! - **Subscriptions**: durable interest bindings with replay-on-subscribe
//! - **Channels**: bounded-lifetime push tokens behind a transport capability
//! - **Batches**: ordered command lists with event hoisting
//!
//! ## Example
//!
//! ```ignore
//! use courier::{CommandRequest, Hub, HubConfig, Namespace, RequestContext};
//! use serde_json::json;
//!
//! let hub = Hub::new(HubConfig::default());
//! let profile = hub.create_profile(None);
//! let client = hub.create_client(Namespace::new("demo"), profile.id)?;
//!
//! let ctx = RequestContext::new(Namespace::new("demo"), client.id);
//! let batch = hub.dispatch(&ctx, &[
//!     CommandRequest::new("createChannel", json!({})),
//!     CommandRequest::new("subscribe", json!({"subject": "room1", "messages": 10})),
//! ]);
//! ```

pub mod clients;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod hub;
pub mod subjects;
pub mod subscriptions;
pub mod transport;
pub mod types;

// Re-exports
pub use clients::{Client, ClientRegistry, Profile};
pub use dispatch::{BatchResponse, BatchStatus, CommandRequest, RequestContext};
pub use error::{HubError, Result};
pub use events::Event;
pub use hub::{Hub, HubConfig, HubStats};
pub use subjects::{AppendOutcome, Subject, SubjectLog, SubjectRegistry};
pub use subscriptions::{ReplayRequest, Subscription, SubscriptionManager};
pub use transport::{
    ChannelConfig, ChannelGrant, ChannelHandle, ChannelProvider, ChannelToken, InProcessChannels,
};
pub use types::*;
