/// Tool for checking a habit's current streak
///
/// This module implements the habit_streak MCP tool.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::storage::HabitStorage;
use crate::tools::{parse_habit_id, parse_user, plural, resolve_today};
use crate::tracker::{CompletionStore, HabitRegistry, TrackerError};

/// Parameters for checking a habit's streak
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StreakParams {
    /// ID of the user making the request (must own the habit)
    pub user_id: String,
    /// ID of the habit
    pub habit_id: String,
    /// Caller's current date, YYYY-MM-DD (default: server's local date)
    pub today: Option<String>,
}

/// Response from checking a streak
#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub habit_id: String,
    pub name: String,
    pub current_streak: u32,
    pub last_completed: Option<NaiveDate>,
    pub message: String,
}

/// Compute the current streak for one habit
pub fn habit_streak<S: HabitStorage>(
    storage: &S,
    params: StreakParams,
) -> Result<StreakResponse, TrackerError> {
    let caller = parse_user(&params.user_id)?;
    let habit_id = parse_habit_id(&params.habit_id)?;
    let today = resolve_today(params.today.as_deref())?;

    let habit = HabitRegistry::new(storage).get_authorized(&habit_id, &caller)?;
    let streak = CompletionStore::new(storage).streak_summary(&habit.id, &caller, today)?;

    let last = match streak.last_completed {
        Some(date) if date == today => "today".to_string(),
        Some(date) => date.to_string(),
        None => "never".to_string(),
    };
    let message = format!(
        "🎯 {}\n   🔥 Current streak: {} day{} | Last completed: {}\n   {}",
        habit.name,
        streak.current_streak,
        plural(streak.current_streak),
        last,
        streak.motivational_message()
    );

    Ok(StreakResponse {
        habit_id: habit.id.to_string(),
        name: habit.name,
        current_streak: streak.current_streak,
        last_completed: streak.last_completed,
        message,
    })
}
