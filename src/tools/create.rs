/// Tool for creating new habits
///
/// This module implements the habit_create MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::Habit;
use crate::storage::HabitStorage;
use crate::tools::parse_user;
use crate::tracker::{HabitRegistry, TrackerError};

/// Parameters for creating a new habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateHabitParams {
    /// ID of the user creating (and owning) the habit
    pub user_id: String,
    /// Name of the habit
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Optional daily target, e.g. 30
    pub target_value: Option<u32>,
    /// Unit for the target, e.g. "minutes"
    pub unit: Option<String>,
}

/// Response from creating a habit
#[derive(Debug, Serialize)]
pub struct CreateHabitResponse {
    pub habit: Habit,
    pub message: String,
}

/// Create a new habit using the provided storage
pub fn create_habit<S: HabitStorage>(
    storage: &S,
    params: CreateHabitParams,
) -> Result<CreateHabitResponse, TrackerError> {
    let owner = parse_user(&params.user_id)?;

    let habit = HabitRegistry::new(storage).create(
        &owner,
        params.name,
        params.description,
        params.target_value,
        params.unit,
    )?;

    let target = habit
        .target_display()
        .map(|t| format!(" (target: {} per day)", t))
        .unwrap_or_default();
    let message = format!("✅ Created habit '{}'{}\nHabit ID: {}", habit.name, target, habit.id);

    Ok(CreateHabitResponse { habit, message })
}
