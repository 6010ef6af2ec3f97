//src/repository.rs
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::model::{Exercise, Workout};
use crate::store::{KeyValueStore, SELECTED_WORKOUT_KEY, WORKOUTS_KEY};

// Store failures never show up here: reads fall back to the seed data and
// writes are logged without rolling back (see the persist helpers).
#[derive(Error, Debug)]
pub enum WorkoutError {
    #[error("Workout name cannot be empty.")]
    BlankName,
    #[error("Cannot delete the last remaining workout.")]
    LastWorkout,
    #[error("Workout not found: {0}")]
    WorkoutNotFound(String),
    #[error("No deletion is awaiting confirmation.")]
    NoPendingDelete,
}

/// Workout collection plus selection, kept in memory and mirrored to the
/// store after every mutation.
pub struct WorkoutRepository<S> {
    store: Arc<S>,
    workouts: Vec<Workout>,
    selected: Option<String>,
    pending_delete: Option<String>,
}

impl<S: KeyValueStore> WorkoutRepository<S> {
    /// Creates an empty repository over `store`. Call [`load`] before use.
    ///
    /// [`load`]: WorkoutRepository::load
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            workouts: Vec::new(),
            selected: None,
            pending_delete: None,
        }
    }

    /// Loads the workout collection and selection from the store.
    ///
    /// A first run (nothing stored yet) seeds the default workouts and
    /// persists them. Unreadable or unparseable data falls back to the seed
    /// set with a logged warning; this method never fails. A stored
    /// selection pointing at a workout that no longer exists falls back to
    /// the first workout in the collection.
    pub async fn load(&mut self) {
        let mut persist_seeds = false;
        self.workouts = match self.store.get(WORKOUTS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Workout>>(&raw) {
                Ok(workouts) => workouts,
                Err(e) => {
                    // The unreadable value stays in the store until the next
                    // successful write overwrites it.
                    warn!("Stored workouts are unreadable, using defaults: {e}");
                    seed_workouts()
                }
            },
            Ok(None) => {
                info!("No stored workouts, seeding defaults");
                persist_seeds = true;
                seed_workouts()
            }
            Err(e) => {
                warn!("Could not read workouts from the store: {e}");
                seed_workouts()
            }
        };
        if persist_seeds {
            self.persist_workouts().await;
        }

        let stored_selection = match self.store.get(SELECTED_WORKOUT_KEY).await {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!("Could not read the workout selection: {e}");
                String::new()
            }
        };
        self.selected = if self.workouts.iter().any(|w| w.id == stored_selection) {
            Some(stored_selection)
        } else {
            self.workouts.first().map(|w| w.id.clone())
        };
    }

    /// All workouts, in user-visible order.
    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    /// Id of the currently selected workout, if any.
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The currently selected workout, if any.
    pub fn selected_workout(&self) -> Option<&Workout> {
        let id = self.selected.as_deref()?;
        self.workouts.iter().find(|w| w.id == id)
    }

    /// Looks up a workout by id.
    pub fn get(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    /// Creates an empty workout from a trimmed name, selects it, and
    /// persists both changes. Returns the new workout's id.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError::BlankName` if the name is empty or whitespace.
    pub async fn create(&mut self, name: &str) -> Result<String, WorkoutError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(WorkoutError::BlankName);
        }
        let workout = Workout::new(trimmed);
        let id = workout.id.clone();
        info!("Creating workout '{trimmed}' ({id})");
        self.workouts.push(workout);
        self.selected = Some(id.clone());
        self.persist_workouts().await;
        self.persist_selection().await;
        Ok(id)
    }

    /// Renames a workout, keeping its id, exercises, and creation time.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError::BlankName` for an empty name and
    /// `WorkoutError::WorkoutNotFound` for an unknown id.
    pub async fn rename(&mut self, id: &str, name: &str) -> Result<(), WorkoutError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(WorkoutError::BlankName);
        }
        let workout = self
            .workouts
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| WorkoutError::WorkoutNotFound(id.to_string()))?;
        workout.name = trimmed.to_string();
        self.persist_workouts().await;
        Ok(())
    }

    /// Selects the workout with the given id and persists the selection
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError::WorkoutNotFound` for an unknown id.
    pub async fn select(&mut self, id: &str) -> Result<(), WorkoutError> {
        if !self.workouts.iter().any(|w| w.id == id) {
            return Err(WorkoutError::WorkoutNotFound(id.to_string()));
        }
        self.selected = Some(id.to_string());
        self.persist_selection().await;
        Ok(())
    }

    /// First half of the two-step deletion: validates the request and
    /// records the id awaiting confirmation.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError::LastWorkout` while only one workout remains,
    /// or `WorkoutError::WorkoutNotFound` for an unknown id.
    pub fn request_delete(&mut self, id: &str) -> Result<(), WorkoutError> {
        if !self.workouts.iter().any(|w| w.id == id) {
            return Err(WorkoutError::WorkoutNotFound(id.to_string()));
        }
        if self.workouts.len() <= 1 {
            return Err(WorkoutError::LastWorkout);
        }
        self.pending_delete = Some(id.to_string());
        Ok(())
    }

    /// Abandons a pending deletion, if any.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Id currently awaiting deletion confirmation, if any.
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Second half of the two-step deletion: removes the workout recorded by
    /// [`request_delete`] and persists the reduced collection. When the
    /// deleted workout was selected, the selection moves to the first
    /// remaining workout and is persisted too. Returns the removed workout.
    ///
    /// The pending id is cleared whether or not the deletion goes through.
    ///
    /// # Errors
    ///
    /// Returns `WorkoutError::NoPendingDelete` without a prior request, and
    /// revalidates the request: `WorkoutError::LastWorkout` or
    /// `WorkoutError::WorkoutNotFound` if the collection changed in between.
    ///
    /// [`request_delete`]: WorkoutRepository::request_delete
    pub async fn confirm_delete(&mut self) -> Result<Workout, WorkoutError> {
        let id = self
            .pending_delete
            .take()
            .ok_or(WorkoutError::NoPendingDelete)?;
        if self.workouts.len() <= 1 {
            return Err(WorkoutError::LastWorkout);
        }
        let index = self
            .workouts
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| WorkoutError::WorkoutNotFound(id.clone()))?;
        let removed = self.workouts.remove(index);
        info!("Deleted workout '{}' ({})", removed.name, removed.id);
        self.persist_workouts().await;
        if self.selected.as_deref() == Some(removed.id.as_str()) {
            self.selected = self.workouts.first().map(|w| w.id.clone());
            self.persist_selection().await;
        }
        Ok(removed)
    }

    /// Replaces the exercise sequence of the named workout and persists the
    /// whole collection. An unknown workout id leaves everything unchanged.
    pub async fn update_exercises(&mut self, workout_id: &str, exercises: Vec<Exercise>) {
        match self.workouts.iter_mut().find(|w| w.id == workout_id) {
            Some(workout) => {
                workout.exercises = exercises;
                self.persist_workouts().await;
            }
            None => debug!("Ignoring exercise update for unknown workout {workout_id}"),
        }
    }

    /// Serializes the collection and overwrites the stored value. Failures
    /// are logged; the in-memory state stays authoritative either way.
    async fn persist_workouts(&self) {
        match serde_json::to_string(&self.workouts) {
            Ok(raw) => {
                if let Err(e) = self.store.set(WORKOUTS_KEY, &raw).await {
                    error!("Failed to persist workouts: {e}");
                }
            }
            Err(e) => error!("Failed to encode workouts: {e}"),
        }
    }

    /// Persists the selected id, or the empty string when nothing is
    /// selected. Failures are logged.
    async fn persist_selection(&self) {
        let id = self.selected.as_deref().unwrap_or("");
        if let Err(e) = self.store.set(SELECTED_WORKOUT_KEY, id).await {
            error!("Failed to persist the workout selection: {e}");
        }
    }
}

/// The two starter workouts present on first run.
fn seed_workouts() -> Vec<Workout> {
    let mut push_day = Workout::new("Push Day");
    push_day.exercises = vec![
        Exercise::new("Bench Press", 3, 8, 60.0),
        Exercise::new("Overhead Press", 3, 10, 40.0),
        Exercise::new("Push-ups", 3, 15, 0.0),
    ];
    let mut pull_day = Workout::new("Pull Day");
    pull_day.exercises = vec![
        Exercise::new("Deadlift", 3, 5, 100.0),
        Exercise::new("Barbell Row", 3, 8, 60.0),
        Exercise::new("Pull-ups", 3, 10, 0.0),
    ];
    vec![push_day, pull_day]
}
