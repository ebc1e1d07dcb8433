//! Subjects (named topics) and their message logs.
//!
//! Subjects are created lazily, at most once per (namespace, name). Each
//! subject owns an append-only message log with ids that are monotonic
//! within the subject; a registry-level key index supports point lookup of
//! any message by its key, independent of subject.

mod log;
mod registry;

pub use log::{AppendOutcome, SubjectLog};
pub use registry::{Subject, SubjectRegistry};
