/// Tools for updating and deleting existing habits
///
/// This module implements the habit_update and habit_delete MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Habit, HabitUpdate};
use crate::storage::HabitStorage;
use crate::tools::{parse_habit_id, parse_user};
use crate::tracker::{HabitRegistry, TrackerError};

/// Parameters for updating an existing habit
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UpdateHabitParams {
    /// ID of the user making the change (must own the habit)
    pub user_id: String,
    /// ID of the habit to update
    pub habit_id: String,
    /// New name
    pub name: Option<String>,
    /// New description; an empty string clears it
    pub description: Option<String>,
    /// New daily target value
    pub target_value: Option<u32>,
    /// New unit for the target; an empty string clears it
    pub unit: Option<String>,
    /// Remove the target value and unit; cannot be combined with
    /// `target_value` or `unit`
    pub clear_target: Option<bool>,
    /// Position in the habit list (lower first)
    pub sort_order: Option<i32>,
    /// Archive (true) or restore (false) the habit
    pub archived: Option<bool>,
}

/// Response from updating a habit
#[derive(Debug, Serialize)]
pub struct UpdateHabitResponse {
    pub habit: Habit,
    pub message: String,
}

/// Update an existing habit on behalf of its owner
pub fn update_habit<S: HabitStorage>(
    storage: &S,
    params: UpdateHabitParams,
) -> Result<UpdateHabitResponse, TrackerError> {
    let caller = parse_user(&params.user_id)?;
    let habit_id = parse_habit_id(&params.habit_id)?;

    let clear_target = params.clear_target.unwrap_or(false);
    if clear_target && (params.target_value.is_some() || params.unit.is_some()) {
        return Err(DomainError::Validation {
            message: "clear_target cannot be combined with target_value or unit".to_string(),
        }
        .into());
    }

    let (target_value, unit) = if clear_target {
        (Some(None), Some(None))
    } else {
        (
            params.target_value.map(Some),
            params.unit.map(|u| if u.trim().is_empty() { None } else { Some(u) }),
        )
    };

    let update = HabitUpdate {
        name: params.name,
        description: params.description.map(Some),
        target_value,
        unit,
        sort_order: params.sort_order,
        archived: params.archived,
    };

    let habit = HabitRegistry::new(storage).update(&habit_id, &caller, update)?;

    let message = match params.archived {
        Some(true) => format!("📦 Archived habit '{}'", habit.name),
        Some(false) => format!("▶️ Restored habit '{}'", habit.name),
        None => format!("✅ Updated habit '{}'", habit.name),
    };

    Ok(UpdateHabitResponse { habit, message })
}

/// Parameters for deleting a habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteHabitParams {
    /// ID of the user making the change (must own the habit)
    pub user_id: String,
    /// ID of the habit to delete
    pub habit_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteHabitResponse {
    pub habit_id: String,
    pub message: String,
}

/// Permanently delete a habit and its completion history
pub fn delete_habit<S: HabitStorage>(
    storage: &S,
    params: DeleteHabitParams,
) -> Result<DeleteHabitResponse, TrackerError> {
    let caller = parse_user(&params.user_id)?;
    let habit_id = parse_habit_id(&params.habit_id)?;

    HabitRegistry::new(storage).delete(&habit_id, &caller)?;

    Ok(DeleteHabitResponse {
        message: format!("🗑️ Deleted habit {} and its completion history", habit_id),
        habit_id: habit_id.to_string(),
    })
}
