//! Batched command dispatch.
//!
//! A batch is an ordered list of commands executed sequentially for one
//! client. Each command produces a response and zero or more events; the
//! dispatcher hoists the events out of each result — in command order —
//! into one top-level stream, so `responses[i]` stays aligned with
//! `commands[i]` while events carry no positional correspondence.

mod dispatcher;
mod types;

pub use dispatcher::run_batch;
pub use types::{BatchResponse, BatchStatus, CommandRequest, RequestContext};
