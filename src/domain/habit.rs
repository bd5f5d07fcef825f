/// Habit entity and related functionality
///
/// This module defines the Habit struct that represents something a user
/// wants to do every day, along with its validation rules and the set of
/// owner-editable fields.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::domain::{HabitId, UserId, DomainError};

/// A habit represents something the user wants to do regularly
///
/// Each habit belongs to exactly one user for its whole lifetime. Only the
/// owner may edit it, log completions against it, or delete it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// The user who created and owns this habit
    pub owner_id: UserId,
    /// Display name (e.g., "Morning Run", "Read for 30min")
    pub name: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// Optional numeric target (e.g., 30 for "30 minutes")
    pub target_value: Option<u32>,
    /// Unit for the target value (e.g., "minutes", "pages", "reps")
    pub unit: Option<String>,
    /// Position in the owner's habit list (lower sorts first)
    pub sort_order: i32,
    /// Archived habits are hidden from listings and accept no new completions
    pub archived: bool,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
    /// When this habit was last modified
    pub updated_at: DateTime<Utc>,
}

/// Owner-editable fields of a habit
///
/// Outer `None` leaves a field untouched; for optional fields `Some(None)`
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub target_value: Option<Option<u32>>,
    pub unit: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub archived: Option<bool>,
}

impl HabitUpdate {
    pub fn is_empty(&self) -> bool {
        *self == HabitUpdate::default()
    }
}

impl Habit {
    /// Create a new habit with validation
    pub fn new(
        owner_id: UserId,
        name: String,
        description: Option<String>,
        target_value: Option<u32>,
        unit: Option<String>,
    ) -> Result<Self, DomainError> {
        Self::validate_name(&name)?;
        Self::validate_description(&description)?;
        Self::validate_target_and_unit(&target_value, &unit)?;

        let now = Utc::now();
        Ok(Self {
            id: HabitId::new(),
            owner_id,
            name: name.trim().to_string(),
            description: normalize_text(description),
            target_value,
            unit: normalize_text(unit),
            sort_order: 0,
            archived: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a habit from existing data (used when loading from database)
    ///
    /// This constructor assumes data is already validated and is mainly used
    /// by the storage layer when loading habits from the database.
    #[allow(clippy::too_many_arguments)]
    pub fn from_existing(
        id: HabitId,
        owner_id: UserId,
        name: String,
        description: Option<String>,
        target_value: Option<u32>,
        unit: Option<String>,
        sort_order: i32,
        archived: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            name,
            description,
            target_value,
            unit,
            sort_order,
            archived,
            created_at,
            updated_at,
        }
    }

    /// Apply an update, validating every field before anything changes
    pub fn apply(&mut self, update: HabitUpdate) -> Result<(), DomainError> {
        if let Some(ref new_name) = update.name {
            Self::validate_name(new_name)?;
        }

        if let Some(ref new_desc) = update.description {
            Self::validate_description(new_desc)?;
        }

        // Target and unit are validated together against the merged result
        let new_target = update.target_value.unwrap_or(self.target_value);
        let new_unit = update.unit.clone().unwrap_or_else(|| self.unit.clone());
        Self::validate_target_and_unit(&new_target, &new_unit)?;

        if let Some(new_name) = update.name {
            self.name = new_name.trim().to_string();
        }
        if let Some(new_description) = update.description {
            self.description = normalize_text(new_description);
        }
        if let Some(new_target_value) = update.target_value {
            self.target_value = new_target_value;
        }
        if let Some(new_unit) = update.unit {
            self.unit = normalize_text(new_unit);
        }
        if let Some(new_sort_order) = update.sort_order {
            self.sort_order = new_sort_order;
        }
        if let Some(new_archived) = update.archived {
            self.archived = new_archived;
        }
        self.updated_at = Utc::now();

        Ok(())
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    /// Get a display string for the target (e.g., "30 minutes")
    pub fn target_display(&self) -> Option<String> {
        match (self.target_value, &self.unit) {
            (Some(value), Some(unit)) => Some(format!("{} {}", value, unit)),
            (Some(value), None) => Some(value.to_string()),
            _ => None,
        }
    }

    // Validation helper methods

    fn validate_name(name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string()
            ));
        }

        if trimmed.chars().count() > 100 {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be longer than 100 characters".to_string()
            ));
        }

        Ok(())
    }

    fn validate_description(description: &Option<String>) -> Result<(), DomainError> {
        if let Some(desc) = description {
            if desc.chars().count() > 500 {
                return Err(DomainError::Validation {
                    message: "Description cannot be longer than 500 characters".to_string()
                });
            }
        }
        Ok(())
    }

    fn validate_target_and_unit(
        target_value: &Option<u32>,
        unit: &Option<String>,
    ) -> Result<(), DomainError> {
        if let Some(value) = target_value {
            if *value == 0 {
                return Err(DomainError::InvalidValue {
                    message: "Target value must be greater than 0".to_string()
                });
            }
            if *value > 10000 {
                return Err(DomainError::InvalidValue {
                    message: "Target value cannot exceed 10000".to_string()
                });
            }
        }

        if let Some(unit_str) = unit {
            let trimmed = unit_str.trim();
            if trimmed.is_empty() {
                return Err(DomainError::InvalidValue {
                    message: "Unit cannot be empty if specified".to_string()
                });
            }
            if trimmed.chars().count() > 20 {
                return Err(DomainError::InvalidValue {
                    message: "Unit cannot be longer than 20 characters".to_string()
                });
            }
        }

        Ok(())
    }
}

/// Trim free text and collapse blank strings to `None`
fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
