/// Basic integration tests
use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use habit_ledger::*;
use tempfile::{tempdir, NamedTempFile};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn user(id: &str) -> UserId {
    UserId::new(id).expect("valid user id")
}

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_server_opens_database() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = HabitTrackerServer::new(temp_file.path().to_path_buf())
            .await
            .expect("Failed to create server");

        let habits = server
            .storage()
            .list_habits(&user("alice"), true)
            .expect("Failed to list habits");
        assert!(habits.is_empty());
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("habits.db");
        let alice = user("alice");

        let habit_id = {
            let server = HabitTrackerServer::new(db_path.clone())
                .await
                .expect("Failed to create first server");
            let habit = HabitRegistry::new(server.storage())
                .create(&alice, "Journal".to_string(), None, None, None)
                .expect("Failed to create habit");
            CompletionStore::new(server.storage())
                .set_completion(&habit.id, &alice, day(2024, 2, 29), true, EntryDetails::default(), day(2024, 3, 1))
                .expect("Failed to mark habit");
            habit.id
        };

        let server = HabitTrackerServer::new(db_path)
            .await
            .expect("Failed to create second server");
        let store = CompletionStore::new(server.storage());

        let dates = store
            .list_completed_dates(&habit_id, &alice, YearMonth::new(2024, 2).unwrap())
            .expect("Failed to list month");
        assert_eq!(dates, vec![day(2024, 2, 29)]);
        assert_eq!(store.current_streak(&habit_id, &alice, day(2024, 3, 1)).unwrap(), 1);
    }

    #[test]
    fn test_concurrent_marks_collapse_to_one_record() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let storage = Arc::new(SqliteStorage::new(temp_dir.path().join("habits.db")).expect("Failed to create storage"));
        let alice = user("alice");
        let habit = HabitRegistry::new(storage.as_ref())
            .create(&alice, "Meditate".to_string(), None, None, None)
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = Arc::clone(&storage);
                let habit_id = habit.id.clone();
                let caller = alice.clone();
                thread::spawn(move || {
                    CompletionStore::new(storage.as_ref())
                        .set_completion(
                            &habit_id,
                            &caller,
                            day(2024, 6, 15),
                            true,
                            EntryDetails { value: Some(i), notes: None },
                            day(2024, 6, 15),
                        )
                        .map(|r| r.is_some())
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().expect("thread panicked").unwrap());
        }

        let records = storage.get_entries_for_habit(&habit.id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_date, day(2024, 6, 15));
    }

    #[test]
    fn test_streak_scenario_end_to_end() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let alice = user("alice");
        let habit = HabitRegistry::new(&storage)
            .create(&alice, "Run".to_string(), None, Some(5), Some("km".to_string()))
            .unwrap();
        let store = CompletionStore::new(&storage);
        let today = day(2024, 3, 3);

        for d in [day(2024, 3, 1), day(2024, 3, 2), day(2024, 3, 3)] {
            store
                .set_completion(&habit.id, &alice, d, true, EntryDetails::default(), today)
                .unwrap();
        }
        assert_eq!(store.current_streak(&habit.id, &alice, today).unwrap(), 3);

        // Today not done yet: yesterday's run still counts
        store
            .set_completion(&habit.id, &alice, today, false, EntryDetails::default(), today)
            .unwrap();
        assert_eq!(store.current_streak(&habit.id, &alice, today).unwrap(), 2);

        // Two days without a completion breaks the streak
        assert_eq!(store.current_streak(&habit.id, &alice, day(2024, 3, 4)).unwrap(), 0);

        // A skipped day is recorded but does not extend the streak
        store
            .log_entry(&habit.id, &alice, today, EntryStatus::Skipped, EntryDetails::default(), today)
            .unwrap();
        let entries = store.list_entries(&habit.id, &alice, day(2024, 3, 1), today).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(store.current_streak(&habit.id, &alice, today).unwrap(), 2);
    }

    #[test]
    fn test_other_user_cannot_touch_habit() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let alice = user("alice");
        let mallory = user("mallory");
        let habit = HabitRegistry::new(&storage)
            .create(&alice, "Read".to_string(), None, None, None)
            .unwrap();
        let store = CompletionStore::new(&storage);
        let today = day(2024, 1, 10);

        let result = store.set_completion(&habit.id, &mallory, today, true, EntryDetails::default(), today);
        assert!(matches!(result, Err(TrackerError::Permission { .. })));
        assert!(storage.get_entry(&habit.id, today).unwrap().is_none());

        let delete = HabitRegistry::new(&storage).delete(&habit.id, &mallory);
        assert!(matches!(delete, Err(TrackerError::Permission { .. })));
        assert!(storage.get_habit(&habit.id).is_ok());
    }

    #[test]
    fn test_storage_interface() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path()).expect("Failed to create storage");

        let as_trait: &dyn HabitStorage = &storage;
        assert!(as_trait.list_habits(&user("nobody"), false).unwrap().is_empty());
    }

    #[test]
    fn test_server_creation_with_block_on() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let server = tokio_test::block_on(HabitTrackerServer::new(temp_dir.path().join("habits.db")));
        assert!(server.is_ok());
    }
}
