//! Subscriptions: durable interest bindings with replay and fan-out.
//!
//! A subscription binds one client to one subject; at most one exists per
//! pair, and re-subscribing is idempotent. Subscribe computes a replay
//! batch from the subject's history; publish scatters the new message to
//! every subscriber whose client holds an active channel. Bindings are
//! deleted on unsubscribe or when the owning client disconnects.

mod manager;

pub use manager::{ReplayRequest, Subscription, SubscriptionManager};
