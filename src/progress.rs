//src/progress.rs
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use crate::config::Units;
use crate::model::WorkoutSession;
use crate::session::{read_history, write_history, SessionFeed};
use crate::store::KeyValueStore;

/// What a front-end should render for the history screen. An empty history
/// is only reported once a load has actually completed, so "still loading"
/// and "verified empty" never blur together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressState<'a> {
    Loading,
    Empty,
    /// Loaded history, newest first.
    Loaded(&'a [WorkoutSession]),
}

/// Session history viewer. Holds the loaded entries, listens on the
/// [`SessionFeed`] for changes, and handles the two-step deletion flow.
pub struct ProgressViewer<S> {
    store: Arc<S>,
    feed: SessionFeed,
    changes: watch::Receiver<u64>,
    sessions: Vec<WorkoutSession>,
    loaded: bool,
    pending_delete: Option<String>,
}

impl<S: KeyValueStore> ProgressViewer<S> {
    /// Creates a viewer in the loading state, already subscribed to `feed`.
    /// Call [`refresh`] to perform the first read.
    ///
    /// [`refresh`]: ProgressViewer::refresh
    pub fn new(store: Arc<S>, feed: SessionFeed) -> Self {
        let changes = feed.subscribe();
        Self {
            store,
            feed,
            changes,
            sessions: Vec::new(),
            loaded: false,
            pending_delete: None,
        }
    }

    /// Reloads the history from the store. Read or decode failures degrade
    /// to an empty list with a logged warning; either way the viewer counts
    /// as loaded afterwards.
    pub async fn refresh(&mut self) {
        // Claim the pending announcement before reading, so a write that
        // lands mid-read leaves the channel marked changed and triggers
        // another refresh.
        let _ = self.changes.borrow_and_update();
        match read_history(self.store.as_ref()).await {
            Ok(sessions) => self.sessions = sessions,
            Err(e) => {
                warn!("Could not read session history: {e}");
                self.sessions = Vec::new();
            }
        }
        self.loaded = true;
    }

    /// Waits until the session history is announced as changed. Typical use:
    ///
    /// ```ignore
    /// while viewer.changed().await {
    ///     viewer.refresh().await;
    /// }
    /// ```
    ///
    /// Returns `false` once the feed has closed. The viewer's own feed
    /// handle (used to announce its deletions) keeps the feed open for as
    /// long as the viewer exists, so in practice such a loop ends by
    /// dropping the viewer or the future returned here, not by a `false`
    /// return.
    pub async fn changed(&mut self) -> bool {
        self.changes.changed().await.is_ok()
    }

    /// Rendering policy for the history screen.
    pub fn state(&self) -> ProgressState<'_> {
        if !self.loaded {
            ProgressState::Loading
        } else if self.sessions.is_empty() {
            ProgressState::Empty
        } else {
            ProgressState::Loaded(&self.sessions)
        }
    }

    /// Loaded history entries, newest first.
    pub fn sessions(&self) -> &[WorkoutSession] {
        &self.sessions
    }

    /// First half of the two-step deletion: records the session id awaiting
    /// confirmation.
    pub fn request_delete(&mut self, session_id: &str) {
        self.pending_delete = Some(session_id.to_string());
    }

    /// Abandons a pending deletion, if any.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Session id currently awaiting deletion confirmation, if any.
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Second half of the two-step deletion: removes the pending entry,
    /// persists the reduced history, and announces the change. Returns
    /// whether an entry was actually removed; confirming an id that is not
    /// in the history (or confirming without a request) leaves everything
    /// unchanged.
    ///
    /// A failed write is logged and the local removal stands; the store
    /// catches up on the next successful write.
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(id) = self.pending_delete.take() else {
            return false;
        };
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            debug!("No session {id} in history, nothing deleted");
            return false;
        }
        match write_history(self.store.as_ref(), &self.sessions).await {
            Ok(()) => self.feed.notify(),
            Err(e) => error!("Failed to persist session deletion: {e}"),
        }
        true
    }

    /// Writes the loaded history as CSV, one row per session, with the
    /// volume column labelled in the given units.
    ///
    /// # Errors
    ///
    /// Returns an error if a record cannot be written to `out`.
    pub fn write_csv<W: Write>(&self, out: W, units: Units) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        let volume_header = format!("Total_Volume_{}", units.weight_label());
        writer.write_record([
            "ID",
            "Completed_UTC",
            "Workout",
            "Exercises",
            "Total_Sets",
            volume_header.as_str(),
        ])?;
        for session in &self.sessions {
            writer.write_record([
                session.id.clone(),
                session.completed_at.to_rfc3339(),
                session.workout_name.clone(),
                session.exercises.len().to_string(),
                session.total_sets.to_string(),
                format!("{:.1}", session.total_volume),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
