/// Tools for listing a user's habits and fetching one habit
///
/// This module implements the habit_list and habit_get MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::Habit;
use crate::storage::HabitStorage;
use crate::tools::{parse_habit_id, parse_user, plural, resolve_today};
use crate::tracker::{CompletionStore, HabitRegistry, TrackerError};

/// Parameters for listing habits
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListHabitsParams {
    /// ID of the user whose habits to list
    pub user_id: String,
    /// Include archived habits (default: false)
    pub include_archived: Option<bool>,
    /// Reference date for streaks, YYYY-MM-DD (default: today)
    pub today: Option<String>,
}

/// Information about a habit in the list
#[derive(Debug, Serialize)]
pub struct HabitSummary {
    pub habit_id: String,
    pub name: String,
    pub target: Option<String>,
    pub current_streak: u32,
    pub archived: bool,
}

/// Response from listing habits
#[derive(Debug, Serialize)]
pub struct ListHabitsResponse {
    pub habits: Vec<HabitSummary>,
    pub message: String,
}

/// List a user's habits with their current streaks
pub fn list_habits<S: HabitStorage>(
    storage: &S,
    params: ListHabitsParams,
) -> Result<ListHabitsResponse, TrackerError> {
    let owner = parse_user(&params.user_id)?;
    let today = resolve_today(params.today.as_deref())?;

    let habits = HabitRegistry::new(storage).list(&owner, params.include_archived.unwrap_or(false))?;
    let store = CompletionStore::new(storage);

    let mut summaries = Vec::with_capacity(habits.len());
    for habit in habits {
        let current_streak = store.current_streak(&habit.id, &owner, today)?;
        summaries.push(HabitSummary {
            habit_id: habit.id.to_string(),
            target: habit.target_display(),
            name: habit.name,
            current_streak,
            archived: habit.archived,
        });
    }

    let message = if summaries.is_empty() {
        "No habits found. Create your first habit to get started!".to_string()
    } else {
        let lines = summaries
            .iter()
            .map(|h| {
                format!(
                    "🎯 {} ({})\n   🔥 Streak: {} day{}{}{}",
                    h.name,
                    h.habit_id,
                    h.current_streak,
                    plural(h.current_streak),
                    h.target.as_ref().map(|t| format!(" | Target: {}", t)).unwrap_or_default(),
                    if h.archived { " | 📦 archived" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("📋 {} habit{}\n\n{}", summaries.len(), plural(summaries.len() as u32), lines)
    };

    Ok(ListHabitsResponse {
        habits: summaries,
        message,
    })
}

/// Parameters for fetching a single habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetHabitParams {
    /// ID of the user making the request
    pub user_id: String,
    /// ID of the habit
    pub habit_id: String,
}

#[derive(Debug, Serialize)]
pub struct GetHabitResponse {
    pub habit: Habit,
    pub message: String,
}

/// Fetch one habit owned by the caller
pub fn get_habit<S: HabitStorage>(
    storage: &S,
    params: GetHabitParams,
) -> Result<GetHabitResponse, TrackerError> {
    let caller = parse_user(&params.user_id)?;
    let habit_id = parse_habit_id(&params.habit_id)?;

    let habit = HabitRegistry::new(storage).get_authorized(&habit_id, &caller)?;

    let mut message = format!("🎯 {}\nHabit ID: {}", habit.name, habit.id);
    if let Some(description) = &habit.description {
        message.push_str(&format!("\n{}", description));
    }
    if let Some(target) = habit.target_display() {
        message.push_str(&format!("\nTarget: {} per day", target));
    }
    message.push_str(&format!("\nCreated: {}", habit.created_at.format("%Y-%m-%d")));
    if habit.archived {
        message.push_str("\n📦 Archived");
    }

    Ok(GetHabitResponse { habit, message })
}
