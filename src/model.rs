//src/model.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name given to an exercise the moment it is added, before the user edits it.
pub const DEFAULT_EXERCISE_NAME: &str = "New Exercise";
/// Default number of sets for a freshly added exercise.
pub const DEFAULT_SETS: u32 = 3;
/// Default number of reps for a freshly added exercise.
pub const DEFAULT_REPS: u32 = 10;

/// Generates an opaque, collision-resistant identifier.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// One exercise line within a workout: a name plus its set/rep/weight scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    /// Stored in the configured units; 0 means bodyweight.
    pub weight: f64,
}

impl Exercise {
    pub fn new(name: &str, sets: u32, reps: u32, weight: f64) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            sets,
            reps,
            weight,
        }
    }

    /// Creates an exercise with the standard starter values and a fresh id.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_EXERCISE_NAME, DEFAULT_SETS, DEFAULT_REPS, 0.0)
    }

    /// Volume contributed by this exercise (sets x weight).
    pub fn volume(&self) -> f64 {
        f64::from(self.sets) * self.weight
    }
}

/// A named, ordered collection of exercises.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    /// Creates an empty workout. The caller is responsible for name
    /// validation; this constructor stores whatever it is given.
    pub fn new(name: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            exercises: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Total number of sets across all exercises, saturating at `u32::MAX`.
    pub fn total_sets(&self) -> u32 {
        self.exercises
            .iter()
            .fold(0, |total, e| total.saturating_add(e.sets))
    }

    /// Total volume (sum of sets x weight) across all exercises.
    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(Exercise::volume).sum()
    }
}

/// An immutable record of one completed run of a workout.
///
/// The exercise list is copied at completion time, so later edits to the
/// workout never change what was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub workout_id: String,
    pub workout_name: String,
    pub exercises: Vec<Exercise>,
    pub completed_at: DateTime<Utc>,
    pub total_sets: u32,
    pub total_volume: f64,
}

impl WorkoutSession {
    /// Snapshots `workout` as a completed session stamped with the current
    /// time, with totals computed from the exercises as they are right now.
    pub fn snapshot(workout: &Workout) -> Self {
        Self {
            id: new_id(),
            workout_id: workout.id.clone(),
            workout_name: workout.name.clone(),
            exercises: workout.exercises.clone(),
            completed_at: Utc::now(),
            total_sets: workout.total_sets(),
            total_volume: workout.total_volume(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workout_totals() {
        let mut workout = Workout::new("Push Day");
        workout.exercises.push(Exercise::new("Bench Press", 3, 8, 60.0));
        workout.exercises.push(Exercise::new("Push-ups", 4, 15, 0.0));

        assert_eq!(workout.total_sets(), 7);
        assert!((workout.total_volume() - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_copies_exercises() {
        let mut workout = Workout::new("Pull Day");
        workout.exercises.push(Exercise::new("Deadlift", 5, 5, 100.0));

        let session = WorkoutSession::snapshot(&workout);
        workout.exercises[0].sets = 1;

        assert_eq!(session.exercises[0].sets, 5);
        assert_eq!(session.total_sets, 5);
        assert!((session.total_volume - 500.0).abs() < f64::EPSILON);
        assert_eq!(session.workout_name, "Pull Day");
        assert_ne!(session.id, workout.id);
    }

    #[test]
    fn test_total_sets_saturates() {
        let mut workout = Workout::new("Push Day");
        workout
            .exercises
            .push(Exercise::new("Bench Press", u32::MAX, 1, 0.0));
        workout.exercises.push(Exercise::new("Push-ups", 5, 1, 0.0));

        assert_eq!(workout.total_sets(), u32::MAX);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Exercise::with_defaults();
        let b = Exercise::with_defaults();
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, DEFAULT_EXERCISE_NAME);
        assert_eq!(a.sets, DEFAULT_SETS);
        assert_eq!(a.reps, DEFAULT_REPS);
        assert!(a.weight.abs() < f64::EPSILON);
    }
}
