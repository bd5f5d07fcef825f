/// Storage layer for persisting habit data
///
/// This module handles all database operations using SQLite. It provides
/// a clean interface for storing and retrieving habits and their
/// completion records.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use chrono::NaiveDate;
use thiserror::Error;
use crate::domain::{CompletionRecord, Habit, HabitId, UserId};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// How an upsert treats the optional details of an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryWrite {
    /// Overwrite status, value and notes with the new record's fields
    Replace,
    /// Overwrite status; keep the stored value/notes where the new record has none
    Merge,
}

/// Trait defining the storage interface for habits
///
/// Implementations must keep at most one completion record per
/// (habit, date) and make `upsert_entry`/`delete_entry` atomic with respect
/// to concurrent callers.
pub trait HabitStorage: Send + Sync {
    /// Create a new habit
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Get a habit by ID
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;

    /// Update an existing habit
    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Delete a habit together with all of its completion records
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    /// List one user's habits ordered by sort order, then creation time
    fn list_habits(
        &self,
        owner_id: &UserId,
        include_archived: bool,
    ) -> Result<Vec<Habit>, StorageError>;

    /// Insert a record, or update the existing one for the same (habit, date)
    ///
    /// Returns the record as stored; an existing record keeps its id.
    fn upsert_entry(
        &self,
        entry: &CompletionRecord,
        mode: EntryWrite,
    ) -> Result<CompletionRecord, StorageError>;

    /// Remove the record for (habit, date); returns whether one existed
    fn delete_entry(&self, habit_id: &HabitId, date: NaiveDate) -> Result<bool, StorageError>;

    /// Get the record for (habit, date), if any
    fn get_entry(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
    ) -> Result<Option<CompletionRecord>, StorageError>;

    /// All records for a habit, newest date first
    fn get_entries_for_habit(&self, habit_id: &HabitId) -> Result<Vec<CompletionRecord>, StorageError>;

    /// Records for a habit within an inclusive date range, oldest first
    fn get_entries_by_date_range(
        &self,
        habit_id: &HabitId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, StorageError>;
}
