/// Habit registry: creation, lookup, ownership checks and edits

use crate::domain::{Habit, HabitId, HabitUpdate, UserId};
use crate::storage::HabitStorage;
use crate::tracker::TrackerError;

/// Owner-scoped access to habits
pub struct HabitRegistry<'a, S: HabitStorage> {
    storage: &'a S,
}

impl<'a, S: HabitStorage> HabitRegistry<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Create a habit owned by `owner_id`
    pub fn create(
        &self,
        owner_id: &UserId,
        name: String,
        description: Option<String>,
        target_value: Option<u32>,
        unit: Option<String>,
    ) -> Result<Habit, TrackerError> {
        let habit = Habit::new(owner_id.clone(), name, description, target_value, unit)?;
        self.storage.create_habit(&habit)?;

        tracing::info!(habit_id = %habit.id, owner = %owner_id, "Created habit '{}'", habit.name);
        Ok(habit)
    }

    /// Look up a habit without any ownership check
    pub fn get(&self, habit_id: &HabitId) -> Result<Habit, TrackerError> {
        Ok(self.storage.get_habit(habit_id)?)
    }

    /// Fail with `Permission` unless `caller` owns the habit
    pub fn authorize(&self, habit: &Habit, caller: &UserId) -> Result<(), TrackerError> {
        if habit.is_owned_by(caller) {
            return Ok(());
        }

        tracing::warn!(habit_id = %habit.id, caller = %caller, "Rejected access to habit owned by another user");
        Err(TrackerError::Permission {
            habit_id: habit.id.to_string(),
            caller: caller.to_string(),
        })
    }

    /// Load a habit and verify the caller owns it
    ///
    /// Every operation that acts on a habit on behalf of a caller goes
    /// through here; the result is never cached between calls.
    pub fn get_authorized(&self, habit_id: &HabitId, caller: &UserId) -> Result<Habit, TrackerError> {
        let habit = self.get(habit_id)?;
        self.authorize(&habit, caller)?;
        Ok(habit)
    }

    /// The owner's habits, ordered for display
    pub fn list(&self, owner_id: &UserId, include_archived: bool) -> Result<Vec<Habit>, TrackerError> {
        Ok(self.storage.list_habits(owner_id, include_archived)?)
    }

    pub fn update(
        &self,
        habit_id: &HabitId,
        caller: &UserId,
        update: HabitUpdate,
    ) -> Result<Habit, TrackerError> {
        let mut habit = self.get_authorized(habit_id, caller)?;
        if update.is_empty() {
            return Ok(habit);
        }

        habit.apply(update)?;
        self.storage.update_habit(&habit)?;

        tracing::info!(habit_id = %habit.id, "Updated habit '{}'", habit.name);
        Ok(habit)
    }

    /// Delete a habit and every completion record it owns
    pub fn delete(&self, habit_id: &HabitId, caller: &UserId) -> Result<(), TrackerError> {
        let habit = self.get_authorized(habit_id, caller)?;
        self.storage.delete_habit(&habit.id)?;

        tracing::info!(habit_id = %habit.id, "Deleted habit '{}'", habit.name);
        Ok(())
    }
}
