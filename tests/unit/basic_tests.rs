/// Basic unit tests to verify core functionality
use chrono::NaiveDate;
use habit_ledger::*;
use tempfile::NamedTempFile;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn completed(habit_id: &HabitId, date: NaiveDate) -> CompletionRecord {
    CompletionRecord::new(habit_id.clone(), date, EntryStatus::Completed, None, None).unwrap()
}

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_habit_creation() {
        let habit = Habit::new(
            UserId::new("alice").unwrap(),
            "Test Habit".to_string(),
            Some("A test habit".to_string()),
            Some(30),
            Some("minutes".to_string()),
        );

        assert!(habit.is_ok());
        let habit = habit.unwrap();
        assert_eq!(habit.name, "Test Habit");
        assert!(!habit.archived);
    }

    #[test]
    fn test_habit_name_validation() {
        let owner = UserId::new("alice").unwrap();
        assert!(Habit::new(owner.clone(), "   ".to_string(), None, None, None).is_err());
        assert!(Habit::new(owner, "x".repeat(101), None, None, None).is_err());
        assert!(UserId::new("").is_err());
    }

    #[test]
    fn test_completion_record_creation() {
        let habit_id = HabitId::new();
        let entry = CompletionRecord::new(
            habit_id.clone(),
            day(2024, 4, 1),
            EntryStatus::Completed,
            Some(20),
            Some("  felt good  ".to_string()),
        )
        .unwrap();

        assert_eq!(entry.habit_id, habit_id);
        assert!(entry.is_completed());
        assert_eq!(entry.notes.as_deref(), Some("felt good"));
    }

    #[test]
    fn test_streak_engine_properties() {
        let habit_id = HabitId::new();
        let today = day(2024, 1, 3);
        let run = vec![
            completed(&habit_id, day(2024, 1, 1)),
            completed(&habit_id, day(2024, 1, 3)),
            completed(&habit_id, day(2024, 1, 2)),
        ];

        assert_eq!(current_streak(&run, today), 3);
        assert_eq!(current_streak(&run[..1], today), 0);
        assert_eq!(current_streak(&[], today), 0);

        let grace = vec![completed(&habit_id, day(2024, 1, 1)), completed(&habit_id, day(2024, 1, 2))];
        assert_eq!(current_streak(&grace, today), 2);
    }

    #[test]
    fn test_year_month_bounds() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), day(2024, 2, 29));
        assert!(feb.contains(day(2024, 2, 1)));
        assert!(!feb.contains(day(2024, 3, 1)));
        assert!(YearMonth::new(2024, 0).is_err());
    }

    #[test]
    fn test_storage_creation() {
        let temp_file = NamedTempFile::new().unwrap();
        let storage = SqliteStorage::new(temp_file.path().to_path_buf());

        assert!(storage.is_ok());
    }
}
