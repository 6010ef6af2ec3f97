//src/session.rs
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use crate::model::{Workout, WorkoutSession};
use crate::store::{KeyValueStore, StoreError, SESSIONS_KEY};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),
    // Covers both directions: encoding on write, decoding on read.
    #[error("Failed to encode or decode session history: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Broadcast channel between whoever writes session history and whoever
/// displays it. Carries a revision counter; receivers only care that it
/// changed. Dropping a receiver is all it takes to unsubscribe.
#[derive(Debug, Clone)]
pub struct SessionFeed {
    tx: Arc<watch::Sender<u64>>,
}

impl SessionFeed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Announces that the session history changed.
    pub fn notify(&self) {
        self.tx.send_modify(|revision| *revision += 1);
    }

    /// Subscribes to history-change announcements.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends completed-workout snapshots to the stored history.
pub struct SessionRecorder<S> {
    store: Arc<S>,
    feed: SessionFeed,
}

impl<S: KeyValueStore> SessionRecorder<S> {
    pub fn new(store: Arc<S>, feed: SessionFeed) -> Self {
        Self { store, feed }
    }

    /// Records a completed run of `workout`: snapshots it with computed
    /// totals, prepends the snapshot to the stored history (newest first),
    /// and announces the change. Returns the recorded session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the history cannot be read, encoded, or
    /// written. On error nothing is appended and no announcement is made;
    /// the stored history stays exactly as it was.
    pub async fn complete(&self, workout: &Workout) -> Result<WorkoutSession, SessionError> {
        let mut history = read_history(self.store.as_ref()).await?;
        let session = WorkoutSession::snapshot(workout);
        history.insert(0, session.clone());
        write_history(self.store.as_ref(), &history).await?;
        info!(
            "Recorded session {} of '{}' ({} sets, volume {})",
            session.id, session.workout_name, session.total_sets, session.total_volume
        );
        self.feed.notify();
        Ok(session)
    }
}

/// Reads and decodes the stored history. Absent means empty; unreadable or
/// unparseable data is an error for the caller to handle.
pub(crate) async fn read_history<S: KeyValueStore>(
    store: &S,
) -> Result<Vec<WorkoutSession>, SessionError> {
    match store.get(SESSIONS_KEY).await? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Encodes and overwrites the stored history.
pub(crate) async fn write_history<S: KeyValueStore>(
    store: &S,
    history: &[WorkoutSession],
) -> Result<(), SessionError> {
    let raw = serde_json::to_string(history)?;
    store.set(SESSIONS_KEY, &raw).await?;
    Ok(())
}
