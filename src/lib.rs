// src/lib.rs
use anyhow::{Context, Result};
// Use anyhow::Result as standard Result for service layer
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

// --- Declare modules ---
mod config;
mod editor;
mod model;
mod progress;
mod repository;
mod session;
pub mod store;

// --- Expose public types ---
pub use config::{
    get_config_path as get_config_path_util, load_config as load_config_util, parse_units,
    save_config as save_config_util, Config, ConfigError, Units,
};

pub use editor::{ExerciseDraft, ExerciseEditor};
pub use model::{
    Exercise, Workout, WorkoutSession, DEFAULT_EXERCISE_NAME, DEFAULT_REPS, DEFAULT_SETS,
};
pub use progress::{ProgressState, ProgressViewer};
pub use repository::{WorkoutError, WorkoutRepository};
pub use session::{SessionError, SessionFeed, SessionRecorder};
pub use store::{
    get_store_path as get_store_path_util, KeyValueStore, MemoryStore, SqliteStore, StoreBackend,
    StoreError, SELECTED_WORKOUT_KEY, SESSIONS_KEY, WORKOUTS_KEY,
};

/// Entry point the front-ends build everything from: configuration plus the
/// shared store and session feed the individual components hang off.
pub struct AppService {
    pub config: Config,
    config_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
    store: Arc<StoreBackend>,
    feed: SessionFeed,
}

impl AppService {
    /// Initializes the application service: loads (or creates) the
    /// configuration file and opens the durable store. When the store
    /// cannot be opened the service falls back to an in-memory store, with
    /// a logged warning; state then lives for the process lifetime only.
    ///
    /// # Errors
    ///
    /// Returns `anyhow::Error` if config path determination or loading fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load_config(&config_path)
            .context(format!("Failed to load config from {config_path:?}"))?;

        let (store, store_path) = match store::get_store_path() {
            Ok(path) => match SqliteStore::open(&path) {
                Ok(sqlite) => (StoreBackend::Sqlite(sqlite), Some(path)),
                Err(e) => {
                    warn!("Store at {path:?} unavailable ({e}), keeping state in memory");
                    (StoreBackend::Memory(MemoryStore::new()), None)
                }
            },
            Err(e) => {
                warn!("Could not determine a store path ({e}), keeping state in memory");
                (StoreBackend::Memory(MemoryStore::new()), None)
            }
        };

        Ok(Self {
            config,
            config_path: Some(config_path),
            store_path,
            store: Arc::new(store),
            feed: SessionFeed::new(),
        })
    }

    /// Builds a service over a fresh in-memory store with the given
    /// configuration. Nothing touches the filesystem; configuration changes
    /// are kept for the process lifetime only.
    pub fn in_memory(config: Config) -> Self {
        Self {
            config,
            config_path: None,
            store_path: None,
            store: Arc::new(StoreBackend::Memory(MemoryStore::new())),
            feed: SessionFeed::new(),
        }
    }

    /// Path of the configuration file, when one is in use.
    pub fn get_config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Path of the durable store file; `None` while running in memory.
    pub fn get_store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    /// Saves the current configuration state. A service without a config
    /// file keeps changes in memory and reports success.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        match &self.config_path {
            Some(path) => config::save_config(path, &self.config),
            None => Ok(()),
        }
    }

    /// Sets the measurement units and saves the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_units(&mut self, units: Units) -> Result<(), ConfigError> {
        self.config.units = units;
        self.save_config()
    }

    /// Sets the step used when nudging staged weight values and saves the
    /// configuration.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidWeightIncrement` if `increment` is not positive.
    /// - `ConfigError` variants if saving fails.
    pub fn set_weight_increment(&mut self, increment: f64) -> Result<(), ConfigError> {
        if increment <= 0.0 {
            return Err(ConfigError::InvalidWeightIncrement(increment));
        }
        self.config.weight_increment = increment;
        self.save_config()
    }

    /// The session change feed shared by recorders and viewers built from
    /// this service.
    pub fn feed(&self) -> SessionFeed {
        self.feed.clone()
    }

    /// Builds the workout repository. Call its `load` before first use.
    pub fn repository(&self) -> WorkoutRepository<StoreBackend> {
        WorkoutRepository::new(Arc::clone(&self.store))
    }

    /// Opens an exercise editing session over `workout`, using the
    /// configured weight increment for nudges.
    pub fn editor(&self, workout: &Workout) -> ExerciseEditor {
        ExerciseEditor::new(workout, self.config.weight_increment)
    }

    /// Builds the session recorder, publishing on this service's feed.
    pub fn recorder(&self) -> SessionRecorder<StoreBackend> {
        SessionRecorder::new(Arc::clone(&self.store), self.feed.clone())
    }

    /// Builds a progress viewer subscribed to this service's feed.
    pub fn viewer(&self) -> ProgressViewer<StoreBackend> {
        ProgressViewer::new(Arc::clone(&self.store), self.feed.clone())
    }
}
