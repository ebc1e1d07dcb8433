//! Profiles and clients.
//!
//! A profile is an end-user identity (anonymous or verified); a client is
//! one connection endpoint owned by a profile. Both are created by the
//! session collaborator; the hub itself only flips the per-client
//! `channel_active` flag from transport lifecycle callbacks.

mod registry;

pub use registry::{Client, ClientRegistry, Profile};
