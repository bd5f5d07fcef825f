/// Tools for reading completion history
///
/// habit_calendar returns the completed days of one month for calendar
/// rendering; habit_entries returns full records over a date range.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{parse_date, CompletionRecord, YearMonth};
use crate::storage::HabitStorage;
use crate::tools::{parse_habit_id, parse_user, plural, resolve_today};
use crate::tracker::{CompletionStore, TrackerError};

/// Parameters for the monthly calendar view
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CalendarParams {
    /// ID of the user making the request (must own the habit)
    pub user_id: String,
    /// ID of the habit
    pub habit_id: String,
    /// Calendar year, e.g. 2024 (default: the current year)
    pub year: Option<i32>,
    /// Month number, 1-12 (default: the current month)
    pub month: Option<u32>,
    /// Caller's current date, YYYY-MM-DD (default: server's local date)
    pub today: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub completed_dates: Vec<NaiveDate>,
    pub message: String,
}

/// List the days in a month on which the habit was completed
pub fn habit_calendar<S: HabitStorage>(
    storage: &S,
    params: CalendarParams,
) -> Result<CalendarResponse, TrackerError> {
    let caller = parse_user(&params.user_id)?;
    let habit_id = parse_habit_id(&params.habit_id)?;
    let current = YearMonth::of(resolve_today(params.today.as_deref())?);
    let month = YearMonth::new(
        params.year.unwrap_or(current.year()),
        params.month.unwrap_or(current.month()),
    )?;

    let completed_dates = CompletionStore::new(storage).list_completed_dates(&habit_id, &caller, month)?;

    let count = completed_dates.len() as u32;
    let message = if completed_dates.is_empty() {
        format!("📅 {}: no completions yet", month)
    } else {
        let days = completed_dates
            .iter()
            .map(|d| d.format("%d").to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("📅 {}: completed on {} day{} ({})", month, count, plural(count), days)
    };

    Ok(CalendarResponse {
        year: month.year(),
        month: month.month(),
        completed_dates,
        message,
    })
}

/// Parameters for listing records over a date range
#[derive(Debug, Deserialize, JsonSchema)]
pub struct EntriesParams {
    /// ID of the user making the request (must own the habit)
    pub user_id: String,
    /// ID of the habit
    pub habit_id: String,
    /// First day of the range, YYYY-MM-DD (inclusive)
    pub start_date: String,
    /// Last day of the range, YYYY-MM-DD (inclusive)
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    pub entries: Vec<CompletionRecord>,
    pub message: String,
}

/// List every record (completed or skipped) in a date range
pub fn habit_entries<S: HabitStorage>(
    storage: &S,
    params: EntriesParams,
) -> Result<EntriesResponse, TrackerError> {
    let caller = parse_user(&params.user_id)?;
    let habit_id = parse_habit_id(&params.habit_id)?;
    let start = parse_date(&params.start_date)?;
    let end = parse_date(&params.end_date)?;

    let entries = CompletionStore::new(storage).list_entries(&habit_id, &caller, start, end)?;

    let message = if entries.is_empty() {
        format!("No entries between {} and {}", start, end)
    } else {
        entries
            .iter()
            .map(|e| {
                let mut line = format!("{} {}", e.entry_date, e.status);
                if let Some(value) = e.value {
                    line.push_str(&format!(" ({})", value));
                }
                if e.has_notes() {
                    line.push_str(&format!(" - {}", e.notes.as_deref().unwrap_or_default()));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(EntriesResponse { entries, message })
}
