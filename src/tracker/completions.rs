/// Completion store: per-day records for a habit
///
/// Only facts are stored. Marking a day complete writes (or refreshes) the
/// single record for that day; unmarking removes it. Reads never see two
/// records for the same day because the storage enforces that atomically.

use chrono::NaiveDate;

use crate::domain::{
    current_streak, CompletionRecord, DomainError, EntryStatus, Habit, HabitId, Streak, UserId,
    YearMonth,
};
use crate::storage::{EntryWrite, HabitStorage};
use crate::tracker::{HabitRegistry, TrackerError};

/// Optional details attached to a day's record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryDetails {
    pub value: Option<u32>,
    pub notes: Option<String>,
}

/// Ownership-checked access to completion records
pub struct CompletionStore<'a, S: HabitStorage> {
    storage: &'a S,
    registry: HabitRegistry<'a, S>,
}

impl<'a, S: HabitStorage> CompletionStore<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self {
            storage,
            registry: HabitRegistry::new(storage),
        }
    }

    /// Mark or unmark a habit as completed on `date`
    ///
    /// `completed == true` upserts a `Completed` record; value and notes are
    /// only overwritten when supplied. `completed == false` deletes the
    /// record if there is one and returns `None`; unmarking a day with no
    /// record is a no-op.
    pub fn set_completion(
        &self,
        habit_id: &HabitId,
        caller: &UserId,
        date: NaiveDate,
        completed: bool,
        details: EntryDetails,
        today: NaiveDate,
    ) -> Result<Option<CompletionRecord>, TrackerError> {
        let habit = self.registry.get_authorized(habit_id, caller)?;

        if !completed {
            let removed = self.storage.delete_entry(&habit.id, date)?;
            tracing::info!(habit_id = %habit.id, date = %date, removed, "Unmarked habit completion");
            return Ok(None);
        }

        let record = self.write(&habit, date, EntryStatus::Completed, details, EntryWrite::Merge, today)?;
        tracing::info!(habit_id = %habit.id, date = %date, "Marked habit completed");
        Ok(Some(record))
    }

    /// Record an explicit status (completed or skipped) for `date`
    ///
    /// Replaces the day's value and notes entirely.
    pub fn log_entry(
        &self,
        habit_id: &HabitId,
        caller: &UserId,
        date: NaiveDate,
        status: EntryStatus,
        details: EntryDetails,
        today: NaiveDate,
    ) -> Result<CompletionRecord, TrackerError> {
        let habit = self.registry.get_authorized(habit_id, caller)?;

        let record = self.write(&habit, date, status, details, EntryWrite::Replace, today)?;
        tracing::info!(habit_id = %habit.id, date = %date, status = %status, "Logged habit entry");
        Ok(record)
    }

    /// Completed dates within one month, ascending
    pub fn list_completed_dates(
        &self,
        habit_id: &HabitId,
        caller: &UserId,
        month: YearMonth,
    ) -> Result<Vec<NaiveDate>, TrackerError> {
        let habit = self.registry.get_authorized(habit_id, caller)?;

        let dates = self
            .storage
            .get_entries_by_date_range(&habit.id, month.first_day(), month.last_day())?
            .into_iter()
            .filter(|r| r.is_completed() && month.contains(r.entry_date))
            .map(|r| r.entry_date)
            .collect();

        Ok(dates)
    }

    /// Every record between `start` and `end` inclusive, ascending
    pub fn list_entries(
        &self,
        habit_id: &HabitId,
        caller: &UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, TrackerError> {
        let habit = self.registry.get_authorized(habit_id, caller)?;

        if start > end {
            return Err(DomainError::InvalidDate(format!(
                "Start date {} is after end date {}",
                start, end
            ))
            .into());
        }

        Ok(self.storage.get_entries_by_date_range(&habit.id, start, end)?)
    }

    /// Every record for the habit, newest first
    pub fn list_all_records(
        &self,
        habit_id: &HabitId,
        caller: &UserId,
    ) -> Result<Vec<CompletionRecord>, TrackerError> {
        let habit = self.registry.get_authorized(habit_id, caller)?;
        Ok(self.storage.get_entries_for_habit(&habit.id)?)
    }

    /// The habit's current streak as of `today`
    pub fn current_streak(
        &self,
        habit_id: &HabitId,
        caller: &UserId,
        today: NaiveDate,
    ) -> Result<u32, TrackerError> {
        let records = self.list_all_records(habit_id, caller)?;
        Ok(current_streak(&records, today))
    }

    /// Streak plus the last completed date, for status displays
    pub fn streak_summary(
        &self,
        habit_id: &HabitId,
        caller: &UserId,
        today: NaiveDate,
    ) -> Result<Streak, TrackerError> {
        let records = self.list_all_records(habit_id, caller)?;
        Ok(Streak::calculate(habit_id.clone(), &records, today))
    }

    fn write(
        &self,
        habit: &Habit,
        date: NaiveDate,
        status: EntryStatus,
        details: EntryDetails,
        mode: EntryWrite,
        today: NaiveDate,
    ) -> Result<CompletionRecord, TrackerError> {
        if habit.archived {
            return Err(DomainError::Validation {
                message: format!("Habit '{}' is archived and cannot be logged", habit.name),
            }
            .into());
        }
        CompletionRecord::validate_entry_date(date, today)?;

        let record = CompletionRecord::new(habit.id.clone(), date, status, details.value, details.notes)?;
        Ok(self.storage.upsert_entry(&record, mode)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HabitUpdate;
    use crate::storage::SqliteStorage;

    const TODAY: (i32, u32, u32) = (2024, 6, 15);

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(TODAY.0, TODAY.1, TODAY.2).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - chrono::Duration::days(n)
    }

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    fn setup() -> (SqliteStorage, HabitId) {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let habit = HabitRegistry::new(&storage)
            .create(&alice(), "Meditate".to_string(), None, Some(10), Some("minutes".to_string()))
            .unwrap();
        (storage, habit.id)
    }

    #[test]
    fn test_mark_twice_is_idempotent() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);

        let first = store
            .set_completion(&habit_id, &alice(), today(), true, EntryDetails::default(), today())
            .unwrap()
            .unwrap();
        let second = store
            .set_completion(&habit_id, &alice(), today(), true, EntryDetails::default(), today())
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.status, second.status);
        assert_eq!(store.list_all_records(&habit_id, &alice()).unwrap().len(), 1);
    }

    #[test]
    fn test_mark_keeps_details_logged_earlier() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);

        store
            .set_completion(
                &habit_id,
                &alice(),
                today(),
                true,
                EntryDetails { value: Some(12), notes: Some("calm".to_string()) },
                today(),
            )
            .unwrap();
        let again = store
            .set_completion(&habit_id, &alice(), today(), true, EntryDetails::default(), today())
            .unwrap()
            .unwrap();

        assert_eq!(again.value, Some(12));
        assert_eq!(again.notes.as_deref(), Some("calm"));
    }

    #[test]
    fn test_mark_then_unmark_leaves_nothing() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);

        store
            .set_completion(&habit_id, &alice(), days_ago(1), true, EntryDetails::default(), today())
            .unwrap();
        let result = store
            .set_completion(&habit_id, &alice(), days_ago(1), false, EntryDetails::default(), today())
            .unwrap();

        assert!(result.is_none());
        assert!(store.list_all_records(&habit_id, &alice()).unwrap().is_empty());
    }

    #[test]
    fn test_unmark_absent_day_is_noop() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);

        let result = store.set_completion(&habit_id, &alice(), today(), false, EntryDetails::default(), today());
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn test_future_date_rejected() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);

        let result = store.set_completion(&habit_id, &alice(), days_ago(-1), true, EntryDetails::default(), today());
        assert!(matches!(result, Err(TrackerError::Validation(DomainError::InvalidDate(_)))));
    }

    #[test]
    fn test_archived_habit_rejects_marks() {
        let (storage, habit_id) = setup();
        HabitRegistry::new(&storage)
            .update(&habit_id, &alice(), HabitUpdate { archived: Some(true), ..Default::default() })
            .unwrap();
        let store = CompletionStore::new(&storage);

        let result = store.set_completion(&habit_id, &alice(), today(), true, EntryDetails::default(), today());
        assert!(matches!(result, Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_other_user_changes_nothing() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);
        let bob = UserId::new("bob").unwrap();
        store
            .set_completion(&habit_id, &alice(), today(), true, EntryDetails::default(), today())
            .unwrap();

        let unmark = store.set_completion(&habit_id, &bob, today(), false, EntryDetails::default(), today());
        assert!(matches!(unmark, Err(TrackerError::Permission { .. })));
        let mark = store.set_completion(&habit_id, &bob, days_ago(1), true, EntryDetails::default(), today());
        assert!(matches!(mark, Err(TrackerError::Permission { .. })));
        assert!(matches!(
            store.current_streak(&habit_id, &bob, today()),
            Err(TrackerError::Permission { .. })
        ));

        let records = store.list_all_records(&habit_id, &alice()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_date, today());
    }

    #[test]
    fn test_month_listing_respects_boundaries() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let habit = HabitRegistry::new(&storage)
            .create(&alice(), "Run".to_string(), None, None, None)
            .unwrap();
        let store = CompletionStore::new(&storage);
        let reference = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();

        for (m, d) in [(2, 29), (3, 1), (3, 15), (3, 31), (4, 1)] {
            let date = NaiveDate::from_ymd_opt(2024, m, d).unwrap();
            store
                .set_completion(&habit.id, &alice(), date, true, EntryDetails::default(), reference)
                .unwrap();
        }
        store
            .log_entry(
                &habit.id,
                &alice(),
                NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                EntryStatus::Skipped,
                EntryDetails::default(),
                reference,
            )
            .unwrap();

        let dates = store
            .list_completed_dates(&habit.id, &alice(), YearMonth::new(2024, 3).unwrap())
            .unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            ]
        );

        let empty = store
            .list_completed_dates(&habit.id, &alice(), YearMonth::new(2024, 1).unwrap())
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);

        let result = store.list_entries(&habit_id, &alice(), today(), days_ago(3));
        assert!(matches!(result, Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_inverted_range_checks_access_first() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);
        let bob = UserId::new("bob").unwrap();

        let stranger = store.list_entries(&habit_id, &bob, today(), days_ago(3));
        assert!(matches!(stranger, Err(TrackerError::Permission { .. })));

        let missing = store.list_entries(&HabitId::new(), &bob, today(), days_ago(3));
        assert!(matches!(missing, Err(TrackerError::NotFound { .. })));
    }

    #[test]
    fn test_streak_from_store() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);
        for n in [1, 2, 3, 5] {
            store
                .set_completion(&habit_id, &alice(), days_ago(n), true, EntryDetails::default(), today())
                .unwrap();
        }

        assert_eq!(store.current_streak(&habit_id, &alice(), today()).unwrap(), 3);

        let summary = store.streak_summary(&habit_id, &alice(), today()).unwrap();
        assert_eq!(summary.last_completed, Some(days_ago(1)));

        // A skipped day replaces the completion and breaks the run
        store
            .log_entry(&habit_id, &alice(), days_ago(2), EntryStatus::Skipped, EntryDetails::default(), today())
            .unwrap();
        assert_eq!(store.current_streak(&habit_id, &alice(), today()).unwrap(), 1);
    }

    #[test]
    fn test_delete_habit_removes_records() {
        let (storage, habit_id) = setup();
        let store = CompletionStore::new(&storage);
        store
            .set_completion(&habit_id, &alice(), today(), true, EntryDetails::default(), today())
            .unwrap();

        HabitRegistry::new(&storage).delete(&habit_id, &alice()).unwrap();

        assert!(storage.get_entries_for_habit(&habit_id).unwrap().is_empty());
        assert!(matches!(
            store.current_streak(&habit_id, &alice(), today()),
            Err(TrackerError::NotFound { .. })
        ));
    }
}
