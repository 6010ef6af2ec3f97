//src/editor.rs
use tracing::debug;

use crate::model::{Exercise, Workout};
use crate::repository::WorkoutRepository;
use crate::store::KeyValueStore;

/// Staged, text-typed field values for one exercise. Nothing reaches the
/// editor's exercise list (or the store) until the draft is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseDraft {
    exercise_id: String,
    pub name: String,
    pub sets: String,
    pub reps: String,
    pub weight: String,
}

impl ExerciseDraft {
    fn from_exercise(exercise: &Exercise) -> Self {
        Self {
            exercise_id: exercise.id.clone(),
            name: exercise.name.clone(),
            sets: exercise.sets.to_string(),
            reps: exercise.reps.to_string(),
            // Round-trip formatting: an untouched commit must write the
            // exact same weight back.
            weight: exercise.weight.to_string(),
        }
    }

    /// Id of the exercise this draft belongs to.
    pub fn exercise_id(&self) -> &str {
        &self.exercise_id
    }
}

/// Editing session over one workout's exercise list: a working copy of the
/// exercises plus the staged text of the row being edited. Every structural
/// change is reported straight back to the repository, which persists the
/// whole collection.
pub struct ExerciseEditor {
    workout_id: String,
    exercises: Vec<Exercise>,
    freshly_added: Option<String>,
    draft: Option<ExerciseDraft>,
    weight_increment: f64,
}

impl ExerciseEditor {
    /// Opens an editing session over the workout's current exercises.
    /// `weight_increment` is the step used by [`nudge_weight`].
    ///
    /// [`nudge_weight`]: ExerciseEditor::nudge_weight
    pub fn new(workout: &Workout, weight_increment: f64) -> Self {
        Self {
            workout_id: workout.id.clone(),
            exercises: workout.exercises.clone(),
            freshly_added: None,
            draft: None,
            weight_increment,
        }
    }

    /// Id of the workout being edited.
    pub fn workout_id(&self) -> &str {
        &self.workout_id
    }

    /// The working copy of the exercise list.
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    /// Id of the most recently added exercise. A front-end uses this to put
    /// the new row straight into edit mode. Cleared once editing starts or
    /// the exercise is deleted.
    pub fn freshly_added(&self) -> Option<&str> {
        self.freshly_added.as_deref()
    }

    /// Appends an exercise with the starter values, marks it as freshly
    /// added, and reports the new list to the repository. Returns the new
    /// exercise's id.
    pub async fn add<S: KeyValueStore>(
        &mut self,
        repository: &mut WorkoutRepository<S>,
    ) -> String {
        let exercise = Exercise::with_defaults();
        let id = exercise.id.clone();
        self.exercises.push(exercise);
        self.freshly_added = Some(id.clone());
        self.report(repository).await;
        id
    }

    /// Replaces the exercise whose id matches `exercise.id` and reports the
    /// change. An unknown id leaves the list unchanged.
    pub async fn update<S: KeyValueStore>(
        &mut self,
        repository: &mut WorkoutRepository<S>,
        exercise: Exercise,
    ) {
        match self.exercises.iter_mut().find(|e| e.id == exercise.id) {
            Some(slot) => {
                *slot = exercise;
                self.report(repository).await;
            }
            None => debug!("Ignoring update for unknown exercise {}", exercise.id),
        }
    }

    /// Removes the exercise with the given id and reports the change. An
    /// unknown id leaves the list unchanged. Any staged draft for the
    /// removed exercise is discarded.
    pub async fn delete<S: KeyValueStore>(
        &mut self,
        repository: &mut WorkoutRepository<S>,
        id: &str,
    ) {
        let before = self.exercises.len();
        self.exercises.retain(|e| e.id != id);
        if self.exercises.len() == before {
            debug!("Ignoring delete for unknown exercise {id}");
            return;
        }
        if self.freshly_added.as_deref() == Some(id) {
            self.freshly_added = None;
        }
        if self.draft.as_ref().map(ExerciseDraft::exercise_id) == Some(id) {
            self.draft = None;
        }
        self.report(repository).await;
    }

    /// Stages the named exercise's fields as editable text and clears its
    /// freshly-added mark. Returns `None` for an unknown id.
    pub fn begin_edit(&mut self, id: &str) -> Option<&ExerciseDraft> {
        let exercise = self.exercises.iter().find(|e| e.id == id)?;
        self.draft = Some(ExerciseDraft::from_exercise(exercise));
        if self.freshly_added.as_deref() == Some(id) {
            self.freshly_added = None;
        }
        self.draft.as_ref()
    }

    /// The staged draft, if an edit is in progress.
    pub fn draft(&self) -> Option<&ExerciseDraft> {
        self.draft.as_ref()
    }

    /// Mutable access to the staged draft, for free-form typing.
    pub fn draft_mut(&mut self) -> Option<&mut ExerciseDraft> {
        self.draft.as_mut()
    }

    /// Discards the staged draft. The last committed values stay in place.
    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Parses the staged draft into exercise fields, applies it as a single
    /// update, and reports it. Unparseable sets or reps become 0;
    /// unparseable or negative weight becomes 0. Returns the committed
    /// exercise, or `None` when no draft was staged (or its exercise was
    /// deleted underneath it).
    pub async fn commit_draft<S: KeyValueStore>(
        &mut self,
        repository: &mut WorkoutRepository<S>,
    ) -> Option<Exercise> {
        let draft = self.draft.take()?;
        let exercise = Exercise {
            id: draft.exercise_id.clone(),
            name: draft.name.trim().to_string(),
            sets: parse_count(&draft.sets),
            reps: parse_count(&draft.reps),
            weight: parse_weight(&draft.weight),
        };
        if !self.exercises.iter().any(|e| e.id == exercise.id) {
            return None;
        }
        self.update(repository, exercise.clone()).await;
        Some(exercise)
    }

    /// Steps the staged sets value by `delta`, never below zero.
    pub fn nudge_sets(&mut self, delta: i32) {
        if let Some(draft) = self.draft.as_mut() {
            nudge_count(&mut draft.sets, delta);
        }
    }

    /// Steps the staged reps value by `delta`, never below zero.
    pub fn nudge_reps(&mut self, delta: i32) {
        if let Some(draft) = self.draft.as_mut() {
            nudge_count(&mut draft.reps, delta);
        }
    }

    /// Steps the staged weight by `delta` times the configured increment,
    /// never below zero.
    pub fn nudge_weight(&mut self, delta: i32) {
        let increment = self.weight_increment;
        if let Some(draft) = self.draft.as_mut() {
            nudge_weight_text(&mut draft.weight, delta, increment);
        }
    }

    async fn report<S: KeyValueStore>(&self, repository: &mut WorkoutRepository<S>) {
        repository
            .update_exercises(&self.workout_id, self.exercises.clone())
            .await;
    }
}

/// Coerces staged text to a count. Anything unparseable becomes 0.
fn parse_count(input: &str) -> u32 {
    input.trim().parse().unwrap_or(0)
}

/// Coerces staged text to a weight. Unparseable or negative input becomes 0.
fn parse_weight(input: &str) -> f64 {
    input.trim().parse::<f64>().map_or(0.0, |w| w.max(0.0))
}

// Helpers to increment/decrement a numeric string field. Unparseable text
// starts from 0, consistent with how a commit would read it.
fn nudge_count(input_str: &mut String, delta: i32) {
    let current = i64::from(parse_count(input_str));
    let next = (current + i64::from(delta)).max(0);
    *input_str = next.to_string();
}

fn nudge_weight_text(input_str: &mut String, delta: i32, increment: f64) {
    let current = parse_weight(input_str);
    let next = (current + f64::from(delta) * increment).max(0.0);
    *input_str = next.to_string();
}
