/// CompletionRecord entity for tracking habit completions
///
/// This module defines the CompletionRecord struct: the stored fact that a
/// habit was completed (or deliberately skipped) on one calendar day.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use crate::domain::{EntryId, EntryStatus, HabitId, DomainError};

/// The adherence state of one habit on one calendar date
///
/// There is at most one record per (habit, date). A missing record means the
/// habit was not completed that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Unique identifier for this record
    pub id: EntryId,
    /// Which habit this record is for
    pub habit_id: HabitId,
    /// Which day this record covers
    pub entry_date: NaiveDate,
    pub status: EntryStatus,
    /// Progress toward the habit's target, if it has one
    pub value: Option<u32>,
    /// User's notes about this day
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompletionRecord {
    /// Create a new record with validation
    pub fn new(
        habit_id: HabitId,
        entry_date: NaiveDate,
        status: EntryStatus,
        value: Option<u32>,
        notes: Option<String>,
    ) -> Result<Self, DomainError> {
        Self::validate_value(&value)?;
        Self::validate_notes(&notes)?;

        let now = Utc::now();
        Ok(Self {
            id: EntryId::new(),
            habit_id,
            entry_date,
            status,
            value,
            notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a record from existing data (used when loading from database)
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: EntryId,
        habit_id: HabitId,
        entry_date: NaiveDate,
        status: EntryStatus,
        value: Option<u32>,
        notes: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            habit_id,
            entry_date,
            status,
            value,
            notes,
            created_at,
            updated_at,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == EntryStatus::Completed
    }

    /// Check if this record has non-blank notes
    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Reject dates after the caller's reference "today"
    pub fn validate_entry_date(date: NaiveDate, today: NaiveDate) -> Result<(), DomainError> {
        if date > today {
            return Err(DomainError::InvalidDate(format!(
                "Cannot record habits for future dates ({} is after {})",
                date, today
            )));
        }
        Ok(())
    }

    fn validate_value(value: &Option<u32>) -> Result<(), DomainError> {
        if let Some(val) = value {
            if *val > 100000 {
                return Err(DomainError::InvalidValue {
                    message: "Value cannot exceed 100000".to_string()
                });
            }
        }
        Ok(())
    }

    fn validate_notes(notes: &Option<String>) -> Result<(), DomainError> {
        if let Some(note_text) = notes {
            if note_text.chars().count() > 500 {
                return Err(DomainError::InvalidValue {
                    message: "Notes cannot be longer than 500 characters".to_string()
                });
            }
        }
        Ok(())
    }
}
