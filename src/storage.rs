use crate::{
    app_dirs::AppDirs,
    session::GameSession,
    settings::Settings,
    stats::{aggregate, SessionStats},
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, warn};

pub const SETTINGS_KEY: &str = "multiplication-game-settings";
pub const SESSIONS_KEY: &str = "multiplication-game-sessions";
pub const STATS_KEY: &str = "multiplication-game-stats";

/// Sessions kept in history; older ones are evicted on save
pub const MAX_SESSIONS: usize = 50;

/// Version tag written around every record
pub const RECORD_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create data directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("record encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record {key} has unsupported version {version}")]
    UnsupportedVersion { key: String, version: u32 },
}

/// Named-record storage backing [`GameStorage`]
pub trait RecordStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Remove every listed record, all or nothing
    fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError>;
}

/// SQLite-backed record store: one key/value table
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO records (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        for key in keys {
            tx.execute("DELETE FROM records WHERE key = ?1", [key])?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Process-local store, used in tests and when no database can be opened
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut records = self.records.borrow_mut();
        for key in keys {
            records.remove(*key);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct OwnedEnvelope<T> {
    version: u32,
    data: T,
}

/// Best-effort persistence for settings, session history and statistics.
///
/// Nothing here returns an error: storage failures are logged and the
/// caller gets the in-memory default instead.
pub struct GameStorage {
    store: Box<dyn RecordStore>,
}

impl GameStorage {
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Open the SQLite store at `path` (or the default location), falling
    /// back to memory if that fails
    pub fn open(path: Option<PathBuf>) -> Self {
        let Some(path) = path.or_else(AppDirs::db_path) else {
            warn!("no data directory available, history will not be kept");
            return Self::in_memory();
        };

        match SqliteStore::open(&path) {
            Ok(store) => {
                debug!(path = %path.display(), "opened record store");
                Self::new(Box::new(store))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "storage unavailable, using memory");
                Self::in_memory()
            }
        }
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.read(key)? else {
            return Ok(None);
        };
        let envelope: OwnedEnvelope<T> = serde_json::from_str(&raw)?;
        if envelope.version != RECORD_VERSION {
            return Err(StoreError::UnsupportedVersion {
                key: key.to_string(),
                version: envelope.version,
            });
        }
        Ok(Some(envelope.data))
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&Envelope {
            version: RECORD_VERSION,
            data: value,
        })?;
        self.store.write(key, &raw)
    }

    fn load_or_default<T: DeserializeOwned>(&self, key: &str, default: impl FnOnce() -> T) -> T {
        match self.load(key) {
            Ok(Some(value)) => value,
            Ok(None) => default(),
            Err(e) => {
                warn!(key, error = %e, "error loading record, using default");
                default()
            }
        }
    }

    pub fn settings(&self) -> Settings {
        self.load_or_default(SETTINGS_KEY, Settings::default)
    }

    pub fn save_settings(&self, settings: &Settings) {
        if let Err(e) = self.save(SETTINGS_KEY, settings) {
            warn!(error = %e, "error saving settings");
        }
    }

    /// Session history, newest first
    pub fn sessions(&self) -> Vec<GameSession> {
        self.load_or_default(SESSIONS_KEY, Vec::new)
    }

    /// Prepend `session`, keep the newest [`MAX_SESSIONS`], then rewrite the
    /// statistics snapshot from the stored history
    pub fn save_session(&self, session: GameSession) {
        let mut sessions = Vec::with_capacity(MAX_SESSIONS);
        sessions.push(session);
        sessions.extend(self.sessions());
        sessions.truncate(MAX_SESSIONS);

        if let Err(e) = self.save(SESSIONS_KEY, &sessions) {
            warn!(error = %e, "error saving session");
            return;
        }
        debug!(count = sessions.len(), "saved session history");

        let stats = aggregate(&sessions);
        if let Err(e) = self.save(STATS_KEY, &stats) {
            warn!(error = %e, "error updating stats, dropping snapshot");
            // without a snapshot, stats() recomputes from the saved history
            if let Err(e) = self.store.remove_all(&[STATS_KEY]) {
                warn!(error = %e, "error dropping stale stats");
            }
        }
    }

    /// Stored statistics snapshot, or one computed from the history when no
    /// snapshot exists
    pub fn stats(&self) -> SessionStats {
        match self.load::<SessionStats>(STATS_KEY) {
            Ok(Some(stats)) => stats,
            Ok(None) => aggregate(&self.sessions()),
            Err(e) => {
                warn!(error = %e, "error loading stats");
                SessionStats::default()
            }
        }
    }

    /// Remove settings, history and statistics in one step
    pub fn clear_all_data(&self) {
        match self
            .store
            .remove_all(&[SETTINGS_KEY, SESSIONS_KEY, STATS_KEY])
        {
            Ok(()) => debug!("cleared all data"),
            Err(e) => warn!(error = %e, "error clearing data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fixtures::{session_ratio, session_with};
    use std::{cell::Cell, rc::Rc};
    use tempfile::tempdir;

    /// Store whose every operation fails, as when the disk is gone
    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Io(std::io::Error::other("unavailable")))
        }
        fn write(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("quota exceeded")))
        }
        fn remove_all(&self, _keys: &[&str]) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("unavailable")))
        }
    }

    /// Memory store that can be told to refuse writes of the stats snapshot
    struct SnapshotFailingStore {
        inner: MemoryStore,
        fail_stats: Rc<Cell<bool>>,
    }

    impl RecordStore for SnapshotFailingStore {
        fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.read(key)
        }
        fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if key == STATS_KEY && self.fail_stats.get() {
                return Err(StoreError::Io(std::io::Error::other("quota exceeded")));
            }
            self.inner.write(key, value)
        }
        fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError> {
            self.inner.remove_all(keys)
        }
    }

    #[test]
    fn failed_snapshot_write_falls_back_to_history() {
        let fail_stats = Rc::new(Cell::new(false));
        let storage = GameStorage::new(Box::new(SnapshotFailingStore {
            inner: MemoryStore::new(),
            fail_stats: Rc::clone(&fail_stats),
        }));

        storage.save_session(session_ratio("a", 1, 2));
        assert_eq!(storage.stats().total_sessions, 1);

        fail_stats.set(true);
        storage.save_session(session_ratio("b", 2, 2));
        assert_eq!(storage.sessions().len(), 2);
        let stats = storage.stats();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_correct_answers, 3);
    }

    #[test]
    fn defaults_when_empty() {
        let storage = GameStorage::in_memory();
        assert_eq!(storage.settings(), Settings::default());
        assert!(storage.sessions().is_empty());
        assert_eq!(storage.stats(), SessionStats::default());
    }

    #[test]
    fn settings_roundtrip() {
        let storage = GameStorage::in_memory();
        let settings = Settings::new(15, [6, 7, 8]).unwrap();
        storage.save_settings(&settings);
        assert_eq!(storage.settings(), settings);
    }

    #[test]
    fn sessions_are_newest_first_and_stats_follow() {
        let storage = GameStorage::in_memory();
        storage.save_session(session_ratio("old", 1, 2));
        storage.save_session(session_ratio("new", 2, 2));

        let ids: Vec<String> = storage.sessions().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["new", "old"]);

        let stats = storage.stats();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_questions, 4);
        assert_eq!(stats.total_correct_answers, 3);
        assert_eq!(stats.recent_sessions[0].id, "new");
    }

    #[test]
    fn history_is_capped_at_fifty() {
        let storage = GameStorage::in_memory();
        for i in 0..=MAX_SESSIONS {
            storage.save_session(session_ratio(&format!("s{i}"), 1, 1));
        }
        let sessions = storage.sessions();
        assert_eq!(sessions.len(), MAX_SESSIONS);
        assert_eq!(sessions[0].id, format!("s{MAX_SESSIONS}"));
        assert!(sessions.iter().all(|s| s.id != "s0"));
        assert_eq!(storage.stats().total_sessions, MAX_SESSIONS);
    }

    #[test]
    fn clear_removes_everything() {
        let storage = GameStorage::in_memory();
        storage.save_settings(&Settings::new(5, [3]).unwrap());
        storage.save_session(session_with("s", &[(3, true)]));

        storage.clear_all_data();
        assert_eq!(storage.settings(), Settings::default());
        assert!(storage.sessions().is_empty());
        assert_eq!(storage.stats().total_sessions, 0);
    }

    #[test]
    fn corrupt_records_fall_back_to_defaults() {
        let store = MemoryStore::new();
        store.write(SETTINGS_KEY, "{not json").unwrap();
        store
            .write(SESSIONS_KEY, r#"{"version":99,"data":[]}"#)
            .unwrap();
        store
            .write(
                STATS_KEY,
                r#"{"version":1,"data":{"totalSessions":"many"}}"#,
            )
            .unwrap();
        let storage = GameStorage::new(Box::new(store));

        assert_eq!(storage.settings(), Settings::default());
        assert!(storage.sessions().is_empty());
        assert_eq!(storage.stats(), SessionStats::default());
    }

    #[test]
    fn empty_table_selection_on_disk_is_replaced_by_default() {
        let store = MemoryStore::new();
        store
            .write(
                SETTINGS_KEY,
                r#"{"version":1,"data":{"numberOfQuestions":5,"selectedTables":[]}}"#,
            )
            .unwrap();
        let storage = GameStorage::new(Box::new(store));
        assert_eq!(storage.settings(), Settings::default());
    }

    #[test]
    fn broken_store_never_fails_the_caller() {
        let storage = GameStorage::new(Box::new(BrokenStore));
        storage.save_settings(&Settings::default());
        storage.save_session(session_ratio("s", 1, 1));
        storage.clear_all_data();
        assert_eq!(storage.settings(), Settings::default());
        assert!(storage.sessions().is_empty());
        assert_eq!(storage.stats(), SessionStats::default());
    }

    #[test]
    fn stats_are_computed_when_snapshot_missing() {
        let store = MemoryStore::new();
        let storage = GameStorage::new(Box::new(store));
        storage.save_session(session_ratio("s", 3, 4));
        storage.store.remove_all(&[STATS_KEY]).unwrap();
        let stats = storage.stats();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.total_correct_answers, 3);
    }

    #[test]
    fn sqlite_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("records.db");
        {
            let storage = GameStorage::new(Box::new(SqliteStore::open(&path).unwrap()));
            storage.save_settings(&Settings::new(20, [9]).unwrap());
            storage.save_session(session_ratio("s", 2, 3));
        }
        let storage = GameStorage::new(Box::new(SqliteStore::open(&path).unwrap()));
        assert_eq!(storage.settings().number_of_questions(), 20);
        assert_eq!(storage.sessions().len(), 1);
        assert_eq!(storage.stats().total_questions, 3);
    }

    #[test]
    fn sqlite_remove_all_clears_listed_keys_only() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.write("a", "1").unwrap();
        store.write("b", "2").unwrap();
        store.write("a", "3").unwrap();
        assert_eq!(store.read("a").unwrap().as_deref(), Some("3"));

        store.remove_all(&["a"]).unwrap();
        assert_eq!(store.read("a").unwrap(), None);
        assert_eq!(store.read("b").unwrap().as_deref(), Some("2"));
    }
}
