/// MCP tools for habit management
///
/// Each tool parses its JSON arguments, resolves the caller and the target
/// habit, and calls into the registry or completion store. Tools never touch
/// storage directly, so every call goes through the ownership check.

pub mod create;
pub mod log;
pub mod status;
pub mod list;
pub mod update;
pub mod calendar;

// Re-export tool functions for easy access
pub use create::*;
pub use log::*;
pub use status::*;
pub use list::*;
pub use update::*;
pub use calendar::*;

use chrono::NaiveDate;

use crate::domain::{parse_date, DomainError, HabitId, UserId};
use crate::tracker::TrackerError;

/// Parse a habit ID argument
pub(crate) fn parse_habit_id(raw: &str) -> Result<HabitId, TrackerError> {
    if raw.trim().is_empty() {
        return Err(DomainError::Validation {
            message: "Habit ID cannot be empty".to_string(),
        }
        .into());
    }

    HabitId::from_string(raw).map_err(|_| {
        DomainError::Validation {
            message: format!("Invalid habit ID format: '{}'", raw),
        }
        .into()
    })
}

pub(crate) fn parse_user(raw: &str) -> Result<UserId, TrackerError> {
    Ok(UserId::new(raw)?)
}

/// The caller's reference date, or the local calendar date when omitted
pub(crate) fn resolve_today(raw: Option<&str>) -> Result<NaiveDate, TrackerError> {
    match raw {
        Some(s) => Ok(parse_date(s)?),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Parse an optional date argument, defaulting to `today`
pub(crate) fn resolve_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, TrackerError> {
    match raw {
        Some(s) => Ok(parse_date(s)?),
        None => Ok(today),
    }
}

fn plural(n: u32) -> &'static str {
    if n == 1 { "" } else { "s" }
}
