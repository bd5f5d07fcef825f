/// SQLite implementation of the habit storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habit data. It handles all SQL queries and data conversion.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::domain::{CompletionRecord, EntryId, EntryStatus, Habit, HabitId, UserId};
use crate::storage::{migrations, EntryWrite, HabitStorage, StorageError};

const HABIT_COLUMNS: &str = "id, user_id, name, description, target_value, unit, sort_order, archived, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, habit_id, entry_date, status, value, notes, created_at, updated_at";

/// SQLite-based storage implementation
///
/// A single connection sits behind a mutex, so every statement (and every
/// multi-statement transaction) runs to completion before the next caller
/// gets the connection. Combined with the unique (habit_id, entry_date)
/// constraint this serializes writes to the same day.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database file and bring its schema up to date
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        // WAL lets readers proceed while a write is in flight
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(|e| StorageError::Connection(format!("Failed to enable WAL: {}", e)))?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!(path = %db_path.display(), journal_mode = %mode, "SQLite storage initialized");
        Ok(storage)
    }

    /// Open a private in-memory database (used by tests and dry runs)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, StorageError> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Connection("Database connection lock poisoned".to_string()))
    }
}

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn parse_timestamp(row: &Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn parse_day(row: &Row<'_>, column: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(column)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_error(column, e))
}

/// Map a row selected with `HABIT_COLUMNS`
fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let id_str: String = row.get(0)?;
    let id = HabitId::from_string(&id_str).map_err(|e| conversion_error(0, e))?;

    let owner_str: String = row.get(1)?;
    let owner_id = UserId::new(owner_str).map_err(|e| conversion_error(1, e))?;

    Ok(Habit::from_existing(
        id,
        owner_id,
        row.get(2)?, // name
        row.get(3)?, // description
        row.get(4)?, // target_value
        row.get(5)?, // unit
        row.get(6)?, // sort_order
        row.get(7)?, // archived
        parse_timestamp(row, 8)?,
        parse_timestamp(row, 9)?,
    ))
}

/// Map a row selected with `ENTRY_COLUMNS`
fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<CompletionRecord> {
    let id_str: String = row.get(0)?;
    let id = EntryId::from_string(&id_str).map_err(|e| conversion_error(0, e))?;

    let habit_id_str: String = row.get(1)?;
    let habit_id = HabitId::from_string(&habit_id_str).map_err(|e| conversion_error(1, e))?;

    let status_str: String = row.get(3)?;
    let status: EntryStatus = status_str.parse().map_err(|e| conversion_error(3, e))?;

    Ok(CompletionRecord::from_existing(
        id,
        habit_id,
        parse_day(row, 2)?,
        status,
        row.get(4)?, // value
        row.get(5)?, // notes
        parse_timestamp(row, 6)?,
        parse_timestamp(row, 7)?,
    ))
}

fn select_entry(
    conn: &Connection,
    habit_id: &HabitId,
    date: NaiveDate,
) -> rusqlite::Result<Option<CompletionRecord>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM completion_records WHERE habit_id = ?1 AND entry_date = ?2",
            ENTRY_COLUMNS
        ),
        params![habit_id.to_string(), date.to_string()],
        entry_from_row,
    )
    .optional()
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

impl HabitStorage for SqliteStorage {
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO habits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                HABIT_COLUMNS
            ),
            params![
                habit.id.to_string(),
                habit.owner_id.as_str(),
                habit.name,
                habit.description,
                habit.target_value,
                habit.unit,
                habit.sort_order,
                habit.archived,
                habit.created_at.to_rfc3339(),
                habit.updated_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(habit_id = %habit.id, owner = %habit.owner_id, "Created habit: {}", habit.name);
        Ok(())
    }

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        let conn = self.conn()?;
        let habit = conn
            .query_row(
                &format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS),
                params![habit_id.to_string()],
                habit_from_row,
            )
            .optional()?;

        habit.ok_or_else(|| StorageError::HabitNotFound {
            habit_id: habit_id.to_string(),
        })
    }

    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let conn = self.conn()?;
        // user_id and created_at are immutable
        let rows_affected = conn.execute(
            "UPDATE habits SET
                name = ?2,
                description = ?3,
                target_value = ?4,
                unit = ?5,
                sort_order = ?6,
                archived = ?7,
                updated_at = ?8
             WHERE id = ?1",
            params![
                habit.id.to_string(),
                habit.name,
                habit.description,
                habit.target_value,
                habit.unit,
                habit.sort_order,
                habit.archived,
                habit.updated_at.to_rfc3339(),
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit.id.to_string(),
            });
        }

        tracing::debug!(habit_id = %habit.id, "Updated habit: {}", habit.name);
        Ok(())
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // Explicit delete keeps the cascade independent of the foreign_keys pragma
        let removed_entries = tx.execute(
            "DELETE FROM completion_records WHERE habit_id = ?1",
            params![habit_id.to_string()],
        )?;
        let rows_affected = tx.execute("DELETE FROM habits WHERE id = ?1", params![habit_id.to_string()])?;

        if rows_affected == 0 {
            // Dropping the transaction rolls it back
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }
        tx.commit()?;

        tracing::debug!(habit_id = %habit_id, removed_entries, "Deleted habit");
        Ok(())
    }

    fn list_habits(
        &self,
        owner_id: &UserId,
        include_archived: bool,
    ) -> Result<Vec<Habit>, StorageError> {
        let mut sql = format!("SELECT {} FROM habits WHERE user_id = ?1", HABIT_COLUMNS);
        if !include_archived {
            sql.push_str(" AND archived = 0");
        }
        sql.push_str(" ORDER BY sort_order ASC, created_at ASC, id ASC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let habits = stmt
            .query_map(params![owner_id.as_str()], habit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(habits)
    }

    fn upsert_entry(
        &self,
        entry: &CompletionRecord,
        mode: EntryWrite,
    ) -> Result<CompletionRecord, StorageError> {
        let on_conflict = match mode {
            EntryWrite::Replace => {
                "status = excluded.status,
                 value = excluded.value,
                 notes = excluded.notes,
                 updated_at = excluded.updated_at"
            }
            EntryWrite::Merge => {
                "status = excluded.status,
                 value = COALESCE(excluded.value, value),
                 notes = COALESCE(excluded.notes, notes),
                 updated_at = excluded.updated_at"
            }
        };

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let written = tx.execute(
            &format!(
                "INSERT INTO completion_records ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (habit_id, entry_date) DO UPDATE SET {}",
                ENTRY_COLUMNS, on_conflict
            ),
            params![
                entry.id.to_string(),
                entry.habit_id.to_string(),
                entry.entry_date.to_string(),
                entry.status.as_str(),
                entry.value,
                entry.notes,
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
            ],
        );
        if let Err(e) = written {
            if is_foreign_key_violation(&e) {
                // The habit was deleted between authorization and this write
                return Err(StorageError::HabitNotFound {
                    habit_id: entry.habit_id.to_string(),
                });
            }
            return Err(e.into());
        }

        let stored = select_entry(&tx, &entry.habit_id, entry.entry_date)?.ok_or_else(|| {
            StorageError::HabitNotFound {
                habit_id: entry.habit_id.to_string(),
            }
        })?;
        tx.commit()?;

        tracing::debug!(
            habit_id = %stored.habit_id,
            date = %stored.entry_date,
            status = %stored.status,
            "Upserted completion record {}",
            stored.id
        );
        Ok(stored)
    }

    fn delete_entry(&self, habit_id: &HabitId, date: NaiveDate) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let rows_affected = conn.execute(
            "DELETE FROM completion_records WHERE habit_id = ?1 AND entry_date = ?2",
            params![habit_id.to_string(), date.to_string()],
        )?;

        tracing::debug!(habit_id = %habit_id, date = %date, removed = rows_affected, "Deleted completion record");
        Ok(rows_affected > 0)
    }

    fn get_entry(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
    ) -> Result<Option<CompletionRecord>, StorageError> {
        let conn = self.conn()?;
        Ok(select_entry(&conn, habit_id, date)?)
    }

    fn get_entries_for_habit(&self, habit_id: &HabitId) -> Result<Vec<CompletionRecord>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM completion_records WHERE habit_id = ?1 ORDER BY entry_date DESC",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![habit_id.to_string()], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn get_entries_by_date_range(
        &self,
        habit_id: &HabitId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<CompletionRecord>, StorageError> {
        let conn = self.conn()?;
        // ISO dates compare correctly as text
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM completion_records
             WHERE habit_id = ?1 AND entry_date BETWEEN ?2 AND ?3
             ORDER BY entry_date ASC",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map(
                params![habit_id.to_string(), start_date.to_string(), end_date.to_string()],
                entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_with_habit() -> (SqliteStorage, Habit) {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let habit = Habit::new(UserId::new("alice").unwrap(), "Read".to_string(), None, Some(20), Some("pages".to_string()))
            .unwrap();
        storage.create_habit(&habit).unwrap();
        (storage, habit)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn record(habit: &Habit, date: NaiveDate, value: Option<u32>, notes: Option<&str>) -> CompletionRecord {
        CompletionRecord::new(
            habit.id.clone(),
            date,
            EntryStatus::Completed,
            value,
            notes.map(str::to_string),
        )
        .unwrap()
    }

    #[test]
    fn test_habit_round_trip() {
        let (storage, habit) = storage_with_habit();
        let loaded = storage.get_habit(&habit.id).unwrap();

        assert_eq!(loaded.id, habit.id);
        assert_eq!(loaded.owner_id, habit.owner_id);
        assert_eq!(loaded.target_display(), Some("20 pages".to_string()));
    }

    #[test]
    fn test_missing_habit() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let result = storage.get_habit(&HabitId::new());
        assert!(matches!(result, Err(StorageError::HabitNotFound { .. })));
    }

    #[test]
    fn test_upsert_keeps_single_row_and_id() {
        let (storage, habit) = storage_with_habit();

        let first = storage
            .upsert_entry(&record(&habit, day(3), Some(5), None), EntryWrite::Replace)
            .unwrap();
        let second = storage
            .upsert_entry(&record(&habit, day(3), Some(9), Some("more")), EntryWrite::Replace)
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.value, Some(9));
        assert_eq!(storage.get_entries_for_habit(&habit.id).unwrap().len(), 1);
    }

    #[test]
    fn test_merge_keeps_existing_details() {
        let (storage, habit) = storage_with_habit();

        storage
            .upsert_entry(&record(&habit, day(3), Some(5), Some("first")), EntryWrite::Replace)
            .unwrap();
        let merged = storage
            .upsert_entry(&record(&habit, day(3), None, None), EntryWrite::Merge)
            .unwrap();

        assert_eq!(merged.value, Some(5));
        assert_eq!(merged.notes.as_deref(), Some("first"));
    }

    #[test]
    fn test_upsert_for_unknown_habit() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        let orphan = CompletionRecord::new(HabitId::new(), day(1), EntryStatus::Completed, None, None).unwrap();

        let result = storage.upsert_entry(&orphan, EntryWrite::Replace);
        assert!(matches!(result, Err(StorageError::HabitNotFound { .. })));
    }

    #[test]
    fn test_entry_ordering() {
        let (storage, habit) = storage_with_habit();
        for d in [5, 1, 3] {
            storage.upsert_entry(&record(&habit, day(d), None, None), EntryWrite::Replace).unwrap();
        }

        let newest_first: Vec<_> = storage
            .get_entries_for_habit(&habit.id)
            .unwrap()
            .into_iter()
            .map(|e| e.entry_date)
            .collect();
        assert_eq!(newest_first, vec![day(5), day(3), day(1)]);

        let in_range: Vec<_> = storage
            .get_entries_by_date_range(&habit.id, day(2), day(5))
            .unwrap()
            .into_iter()
            .map(|e| e.entry_date)
            .collect();
        assert_eq!(in_range, vec![day(3), day(5)]);
    }

    #[test]
    fn test_delete_habit_cascades() {
        let (storage, habit) = storage_with_habit();
        storage.upsert_entry(&record(&habit, day(1), None, None), EntryWrite::Replace).unwrap();

        storage.delete_habit(&habit.id).unwrap();

        assert!(storage.get_entries_for_habit(&habit.id).unwrap().is_empty());
        assert!(matches!(
            storage.delete_habit(&habit.id),
            Err(StorageError::HabitNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_entry_reports_presence() {
        let (storage, habit) = storage_with_habit();
        storage.upsert_entry(&record(&habit, day(2), None, None), EntryWrite::Replace).unwrap();

        assert!(storage.delete_entry(&habit.id, day(2)).unwrap());
        assert!(!storage.delete_entry(&habit.id, day(2)).unwrap());
        assert!(storage.get_entry(&habit.id, day(2)).unwrap().is_none());
    }
}
