/// Ownership-checked operations over habits and their completion records
///
/// `HabitRegistry` owns habit identity and ownership; `CompletionStore` owns
/// the per-day records and delegates streak counting to the pure engine in
/// `domain::streak`. Both re-check ownership on every call.

pub mod registry;
pub mod completions;

pub use registry::HabitRegistry;
pub use completions::{CompletionStore, EntryDetails};

use thiserror::Error;
use crate::domain::DomainError;
use crate::storage::StorageError;

/// Errors surfaced to callers of the registry and completion store
#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Habit not found: {habit_id}")]
    NotFound { habit_id: String },

    #[error("User {caller} is not allowed to access habit {habit_id}")]
    Permission { habit_id: String, caller: String },

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for TrackerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::HabitNotFound { habit_id } => TrackerError::NotFound { habit_id },
            other => TrackerError::Storage(other),
        }
    }
}

impl TrackerError {
    /// Stable classification for the request layer
    pub fn kind(&self) -> &'static str {
        match self {
            TrackerError::NotFound { .. } => "not_found",
            TrackerError::Permission { .. } => "forbidden",
            TrackerError::Validation(_) => "bad_request",
            TrackerError::Storage(_) => "internal",
        }
    }
}
