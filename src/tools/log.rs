/// Tools for recording habit completions
///
/// This module implements the habit_mark MCP tool (check or uncheck a day,
/// as a calendar view does) and the habit_log tool (record a status with
/// optional progress and notes).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{CompletionRecord, EntryStatus};
use crate::storage::HabitStorage;
use crate::tools::{parse_habit_id, parse_user, plural, resolve_date, resolve_today};
use crate::tracker::{CompletionStore, EntryDetails, TrackerError};

/// Parameters for marking a day complete or not
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MarkHabitParams {
    /// ID of the user making the change (must own the habit)
    pub user_id: String,
    /// ID of the habit
    pub habit_id: String,
    /// Day to mark, YYYY-MM-DD (default: today)
    pub date: Option<String>,
    /// true to mark completed, false to remove the completion (default: true)
    pub completed: Option<bool>,
    /// Amount achieved, e.g. 30 minutes
    pub value: Option<u32>,
    /// Notes about the day
    pub notes: Option<String>,
    /// Caller's current date, YYYY-MM-DD (default: server's local date)
    pub today: Option<String>,
}

/// Response from marking a day
#[derive(Debug, Serialize)]
pub struct MarkHabitResponse {
    /// The stored record, or `None` after unmarking
    pub record: Option<CompletionRecord>,
    pub current_streak: u32,
    pub message: String,
}

/// Mark (or unmark) a habit for one day and report the resulting streak
pub fn mark_habit<S: HabitStorage>(
    storage: &S,
    params: MarkHabitParams,
) -> Result<MarkHabitResponse, TrackerError> {
    let caller = parse_user(&params.user_id)?;
    let habit_id = parse_habit_id(&params.habit_id)?;
    let today = resolve_today(params.today.as_deref())?;
    let date = resolve_date(params.date.as_deref(), today)?;
    let completed = params.completed.unwrap_or(true);

    let store = CompletionStore::new(storage);
    let record = store.set_completion(
        &habit_id,
        &caller,
        date,
        completed,
        EntryDetails {
            value: params.value,
            notes: params.notes,
        },
        today,
    )?;
    let current_streak = store.current_streak(&habit_id, &caller, today)?;

    let message = if completed {
        format!(
            "🔥 Marked {} as done! Current streak: {} day{}",
            date,
            current_streak,
            plural(current_streak)
        )
    } else {
        format!(
            "↩️ Cleared completion for {}. Current streak: {} day{}",
            date,
            current_streak,
            plural(current_streak)
        )
    };

    Ok(MarkHabitResponse {
        record,
        current_streak,
        message,
    })
}

/// Parameters for logging an entry with an explicit status
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LogHabitParams {
    /// ID of the user making the change (must own the habit)
    pub user_id: String,
    /// ID of the habit
    pub habit_id: String,
    /// Day to log, YYYY-MM-DD (default: today)
    pub date: Option<String>,
    /// "completed" or "skipped" (default: completed)
    pub status: Option<String>,
    /// Amount achieved, e.g. 30 minutes
    pub value: Option<u32>,
    /// Notes about the day
    pub notes: Option<String>,
    /// Caller's current date, YYYY-MM-DD (default: server's local date)
    pub today: Option<String>,
}

/// Response from logging an entry
#[derive(Debug, Serialize)]
pub struct LogHabitResponse {
    pub record: CompletionRecord,
    pub current_streak: u32,
    pub message: String,
}

/// Log a habit entry, replacing any earlier entry for the same day
pub fn log_habit<S: HabitStorage>(
    storage: &S,
    params: LogHabitParams,
) -> Result<LogHabitResponse, TrackerError> {
    let caller = parse_user(&params.user_id)?;
    let habit_id = parse_habit_id(&params.habit_id)?;
    let today = resolve_today(params.today.as_deref())?;
    let date = resolve_date(params.date.as_deref(), today)?;
    let status = match params.status.as_deref() {
        Some(s) => s.parse::<EntryStatus>()?,
        None => EntryStatus::Completed,
    };

    let store = CompletionStore::new(storage);
    let record = store.log_entry(
        &habit_id,
        &caller,
        date,
        status,
        EntryDetails {
            value: params.value,
            notes: params.notes,
        },
        today,
    )?;
    let current_streak = store.current_streak(&habit_id, &caller, today)?;

    let message = match status {
        EntryStatus::Completed => format!(
            "🔥 Logged habit completion for {}! Current streak: {} day{}",
            date,
            current_streak,
            plural(current_streak)
        ),
        EntryStatus::Skipped => format!(
            "⏭️ Logged {} as skipped. Current streak: {} day{}",
            date,
            current_streak,
            plural(current_streak)
        ),
    };

    Ok(LogHabitResponse {
        record,
        current_streak,
        message,
    })
}
