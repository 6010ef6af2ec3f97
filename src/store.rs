//src/store.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Store key for the serialized workout collection.
pub const WORKOUTS_KEY: &str = "liftlog.workouts";
/// Store key for the selected workout id (bare string, empty when none).
pub const SELECTED_WORKOUT_KEY: &str = "liftlog.selected_workout";
/// Store key for the serialized session history, newest first.
pub const SESSIONS_KEY: &str = "liftlog.sessions";

const STORE_FILE_NAME: &str = "liftlog.sqlite";
const DATA_ENV_VAR: &str = "LIFTLOG_DATA_DIR";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not determine application data directory.")]
    DataDir,

    #[error("I/O error accessing store file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// An asynchronous, process-wide, string-keyed store.
///
/// Values are replaced whole; there is no removal operation beyond
/// overwriting a key. Implementations must tolerate concurrent readers.
#[allow(async_fn_in_trait)] // single-runtime crate, no Send bound wanted
pub trait KeyValueStore {
    /// Reads the value stored under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be queried.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write does not reach the backend.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Resolves the path to the durable store file, creating the data directory
/// if needed. `LIFTLOG_DATA_DIR` overrides the platform data directory.
///
/// # Errors
///
/// Returns `StoreError::DataDir` if no data directory can be determined, or
/// `StoreError::Io` if the directory cannot be created.
pub fn get_store_path() -> Result<PathBuf, StoreError> {
    let data_dir = match std::env::var(DATA_ENV_VAR) {
        Ok(dir) => PathBuf::from(dir),
        // Same dir name as the config dir.
        Err(_) => dirs::data_dir().ok_or(StoreError::DataDir)?.join("liftlog"),
    };
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
    }
    Ok(data_dir.join(STORE_FILE_NAME))
}

/// Durable store backed by a single SQLite key-value table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (and initializes, if new) the store file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        init_store(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory store, mainly for tests.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Sqlite` if the connection cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_store(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn init_store(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Volatile store. State lives for the process lifetime only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The store a running service actually uses: durable when the SQLite file
/// could be opened, in-memory otherwise.
pub enum StoreBackend {
    Sqlite(SqliteStore),
    Memory(MemoryStore),
}

impl KeyValueStore for StoreBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            StoreBackend::Sqlite(store) => store.get(key).await,
            StoreBackend::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            StoreBackend::Sqlite(store) => store.set(key, value).await,
            StoreBackend::Memory(store) => store.set(key, value).await,
        }
    }
}
