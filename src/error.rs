use thiserror::Error;

use crate::db::DatabaseError;

/// Engine-level failure taxonomy.
///
/// Validation and NotFound are raised before any mutation. Persistence wraps
/// a store fault on the primary schedule record and aborts the workflow.
/// Dependent-record sync failures are deliberately NOT here: they are
/// collected into a [`crate::sync::SyncReport`] and returned alongside a
/// successful outcome.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("validation failed: {}", reasons.join("; "))]
    Validation { reasons: Vec<String> },

    #[error("schedule not found: {id}")]
    NotFound { id: String },

    #[error(transparent)]
    Persistence(#[from] DatabaseError),
}

impl LifecycleError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reasons: vec![reason.into()],
        }
    }
}
