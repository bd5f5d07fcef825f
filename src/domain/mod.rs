/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, CompletionRecord, Streak) and
/// their validation rules. The streak engine lives here too since it is a pure
/// function over domain values.

pub mod habit;
pub mod entry;
pub mod streak;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use entry::*;
pub use streak::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}
