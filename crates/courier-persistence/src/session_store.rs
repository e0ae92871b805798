//! Per-chat session state stores.
//!
//! A session is an opaque JSON mapping owned by one chat. The folder browser
//! keeps its path digest table there under `path_mappings`, so clearing or
//! expiring a session also drops every digest issued to it.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use courier_core::{PathMappings, SessionData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::atomic::{atomic_write_json, read_json_optional, remove_if_exists};
use crate::error::{PersistenceError, Result};

/// Stored state of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    #[serde(default)]
    pub data: SessionData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Create an empty session.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            data: SessionData::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the session as active now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether the session has been idle for longer than `ttl` at `now`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.updated_at) > ttl
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// The session's path digest table.
    pub fn path_mappings(&self) -> PathMappings {
        PathMappings::load(&self.data)
    }

    pub fn set_path_mappings(&mut self, mappings: &PathMappings) {
        mappings.store_into(&mut self.data);
    }
}

/// Persistence for session records keyed by session ID.
pub trait SessionStore: Send + Sync {
    /// Load a session, or None if it was never stored or has been cleared.
    fn get(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Store a session, replacing any previous state.
    fn set(&self, record: &SessionRecord) -> Result<()>;

    /// Drop a session's state. Returns whether anything was removed.
    fn clear(&self, session_id: &str) -> Result<bool>;

    /// IDs of every stored session.
    fn list_ids(&self) -> Result<Vec<String>>;

    /// Clear every session idle for longer than `ttl`. Returns how many were cleared.
    fn purge_expired(&self, ttl: Duration) -> Result<usize> {
        let now = Utc::now();
        let mut purged = 0;

        for id in self.list_ids()? {
            let stale = match self.get(&id) {
                Ok(Some(record)) => record.is_expired(ttl, now),
                Ok(None) => false,
                Err(PersistenceError::SerializeError(e)) => {
                    warn!(session_id = %id, error = %e, "Discarding unreadable session");
                    true
                }
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Failed to load session during purge");
                    false
                }
            };
            if !stale {
                continue;
            }

            match self.clear(&id) {
                Ok(true) => purged += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Failed to clear session during purge");
                }
            }
        }

        if purged > 0 {
            debug!(count = purged, "Purged expired sessions");
        }
        Ok(purged)
    }
}

/// Session IDs become file names, so only a conservative alphabet is allowed.
fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidSessionId(session_id.to_string()))
    }
}

/// Stores each session as a JSON file:
/// ```text
/// base_path/
/// ├── 123456789.json
/// └── -100987654.json
/// ```
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.base_path.join(format!("{}.json", session_id)))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        read_json_optional(&self.session_path(session_id)?)
    }

    fn set(&self, record: &SessionRecord) -> Result<()> {
        let path = self.session_path(&record.session_id)?;
        atomic_write_json(&path, record)?;
        debug!(session_id = %record.session_id, "Saved session");
        Ok(())
    }

    fn clear(&self, session_id: &str) -> Result<bool> {
        remove_if_exists(&self.session_path(session_id)?)
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let read_err = |source| PersistenceError::ReadError {
            path: self.base_path.clone(),
            source,
        };

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_path).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Keeps sessions in process memory; state is lost on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let sessions = self.sessions.read().map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(sessions.get(session_id).cloned())
    }

    fn set(&self, record: &SessionRecord) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(|_| PersistenceError::LockPoisoned)?;
        sessions.insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    fn clear(&self, session_id: &str) -> Result<bool> {
        let mut sessions = self.sessions.write().map_err(|_| PersistenceError::LockPoisoned)?;
        Ok(sessions.remove(session_id).is_some())
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let sessions = self.sessions.read().map_err(|_| PersistenceError::LockPoisoned)?;
        let mut ids: Vec<String> = sessions.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const LONG_PATH: &str =
        "/folder1/folder2/folder3/folder4/folder5/folder6/folder7/folder8/folder9";

    fn record_with_mapping(id: &str) -> SessionRecord {
        let mut record = SessionRecord::new(id);
        let mut mappings = record.path_mappings();
        mappings.put("be560526", LONG_PATH);
        record.set_path_mappings(&mappings);
        record
    }

    fn exercise_store(store: &dyn SessionStore) {
        assert!(store.get("42").unwrap().is_none());

        let record = record_with_mapping("42");
        store.set(&record).unwrap();

        let loaded = store.get("42").unwrap().unwrap();
        assert_eq!(loaded.path_mappings().get("be560526"), Some(LONG_PATH));
        assert_eq!(store.list_ids().unwrap(), vec!["42".to_string()]);

        assert!(store.clear("42").unwrap());
        assert!(!store.clear("42").unwrap());
        assert!(store.get("42").unwrap().is_none());
    }

    #[test]
    fn test_file_store_lifecycle() {
        let dir = tempdir().unwrap();
        exercise_store(&FileSessionStore::new(dir.path().join("sessions")));
    }

    #[test]
    fn test_memory_store_lifecycle() {
        exercise_store(&MemorySessionStore::new());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        FileSessionStore::new(dir.path()).set(&record_with_mapping("-100123")).unwrap();

        let reopened = FileSessionStore::new(dir.path());
        let loaded = reopened.get("-100123").unwrap().unwrap();
        assert_eq!(loaded.path_mappings().len(), 1);
    }

    #[test]
    fn test_file_store_rejects_bad_ids() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        for id in ["", "../escape", "a/b", "42.json"] {
            assert!(matches!(
                store.get(id),
                Err(PersistenceError::InvalidSessionId(_))
            ));
        }
    }

    #[test]
    fn test_list_ids_missing_dir() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("never-created"));
        assert!(store.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_record_expiry() {
        let mut record = SessionRecord::new("42");
        let now = Utc::now();
        assert!(!record.is_expired(Duration::hours(1), now));

        record.updated_at = now - Duration::hours(2);
        assert!(record.is_expired(Duration::hours(1), now));

        record.touch();
        assert!(!record.is_expired(Duration::hours(1), Utc::now()));
    }

    #[test]
    fn test_purge_expired() {
        let store = MemorySessionStore::new();

        let mut stale = record_with_mapping("1");
        stale.updated_at = Utc::now() - Duration::hours(30);
        store.set(&stale).unwrap();
        store.set(&record_with_mapping("2")).unwrap();

        assert_eq!(store.purge_expired(Duration::hours(24)).unwrap(), 1);
        assert_eq!(store.list_ids().unwrap(), vec!["2".to_string()]);
    }

    #[test]
    fn test_purge_discards_unreadable_files() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        let mut stale = record_with_mapping("1");
        stale.updated_at = Utc::now() - Duration::hours(30);
        store.set(&stale).unwrap();
        store.set(&record_with_mapping("2")).unwrap();
        fs::write(dir.path().join("3.json"), "{ not json").unwrap();

        assert_eq!(store.purge_expired(Duration::hours(24)).unwrap(), 2);
        assert_eq!(store.list_ids().unwrap(), vec!["2".to_string()]);
    }

    /// Memory store whose `clear` fails for one session.
    struct StubbornStore {
        inner: MemorySessionStore,
        stuck: &'static str,
    }

    impl SessionStore for StubbornStore {
        fn get(&self, session_id: &str) -> Result<Option<SessionRecord>> {
            self.inner.get(session_id)
        }

        fn set(&self, record: &SessionRecord) -> Result<()> {
            self.inner.set(record)
        }

        fn clear(&self, session_id: &str) -> Result<bool> {
            if session_id == self.stuck {
                return Err(PersistenceError::LockPoisoned);
            }
            self.inner.clear(session_id)
        }

        fn list_ids(&self) -> Result<Vec<String>> {
            self.inner.list_ids()
        }
    }

    #[test]
    fn test_purge_continues_past_failed_clear() {
        let store = StubbornStore {
            inner: MemorySessionStore::new(),
            stuck: "1",
        };
        for id in ["1", "2"] {
            let mut stale = record_with_mapping(id);
            stale.updated_at = Utc::now() - Duration::hours(30);
            store.set(&stale).unwrap();
        }

        assert_eq!(store.purge_expired(Duration::hours(24)).unwrap(), 1);
        assert_eq!(store.list_ids().unwrap(), vec!["1".to_string()]);
    }

    #[test]
    fn test_record_values() {
        let mut record = SessionRecord::new("42");
        record.set("current_folder", "/Photos");
        record.set("page", 2);
        assert_eq!(record.get_str("current_folder"), Some("/Photos"));
        assert_eq!(record.get("page").and_then(Value::as_u64), Some(2));
        assert_eq!(record.get_str("page"), None);
    }
}
