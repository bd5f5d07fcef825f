/// Streak calculation
///
/// The current streak is the number of consecutive calendar days, walking
/// backward from today, that each have a completed record. A habit not yet
/// completed today stays alive until the day is over: the walk may start from
/// yesterday instead. Once a full day passes without a completion the streak
/// is zero.

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use crate::domain::{CompletionRecord, HabitId};

/// Calculated streak information for a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    /// Which habit this streak data is for
    pub habit_id: HabitId,
    /// Consecutive days completed, ending today or yesterday
    pub current_streak: u32,
    /// When the habit was last completed (None if never completed)
    pub last_completed: Option<NaiveDate>,
}

impl Streak {
    /// Calculate streak information from a habit's records
    pub fn calculate(habit_id: HabitId, records: &[CompletionRecord], today: NaiveDate) -> Self {
        let last_completed = records
            .iter()
            .filter(|r| r.is_completed())
            .map(|r| r.entry_date)
            .max();

        Self {
            habit_id,
            current_streak: current_streak(records, today),
            last_completed,
        }
    }

    /// Get a motivational message based on current streak status
    pub fn motivational_message(&self) -> String {
        match self.current_streak {
            0 => "Ready to start your streak! Every journey begins with a single step.".to_string(),
            1 => "Great start! One day down, keep the momentum going.".to_string(),
            2..=6 => format!("Nice work! {} days in a row. You're building a strong habit.", self.current_streak),
            7..=13 => format!("Excellent! {} days strong. You're in the groove now!", self.current_streak),
            14..=29 => format!("Amazing! {} days straight. This is becoming second nature.", self.current_streak),
            _ => format!("Incredible! {} days of consistency. Keep it going!", self.current_streak),
        }
    }
}

/// Count the current streak ending at `today` (or yesterday)
///
/// Records that are not `Completed` are ignored. Input order does not matter.
/// Dates later than the cursor (duplicates, or anything after `today`) are
/// skipped without being counted.
pub fn current_streak(records: &[CompletionRecord], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = records
        .iter()
        .filter(|r| r.is_completed())
        .map(|r| r.entry_date)
        .collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    let Some(yesterday) = today.pred_opt() else {
        return 0;
    };

    // Anchor on the most recent completion on or before today
    let Some(&latest) = dates.iter().find(|d| **d <= today) else {
        return 0;
    };
    let mut expected = if latest == today {
        today
    } else if latest == yesterday {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    for date in dates {
        if date == expected {
            streak += 1;
            match expected.pred_opt() {
                Some(prev) => expected = prev,
                None => break,
            }
        } else if date < expected {
            break;
        }
        // date > expected: duplicate or future-dated, skip
    }

    streak
}
