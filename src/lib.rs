//! Cadence — schedule lifecycle engine for recurring clinical tasks.
//!
//! Governs the state machine between an active recurring schedule and its
//! paused/completed/cancelled states, computes resume dates and missed
//! occurrences, and keeps the dependent execution and notification record
//! streams aligned with the schedule through idempotent upserts.

pub mod dates;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod store;
pub mod sync;
pub mod transition;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::LifecycleError;
pub use lifecycle::{
    EngineContext, LifecycleManager, PauseOptions, PauseOutcome, ResumeOptions, ResumeOutcome,
};
pub use store::{SqliteStore, Store};
pub use sync::{SyncIssue, SyncReport};
pub use transition::{validate_transition, RequiredAction, ValidationResult};
