//! Key-value session store: history blobs and the bearer token.
//!
//! History is persisted as one serialized JSON blob per session scope,
//! written with a single upsert so readers always observe a complete
//! snapshot; there is no state in which a partially-written history is
//! visible. Corrupted or missing blobs read back as an empty history;
//! a read never fails the caller.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::{sqlite, SessionStoreError};
use crate::models::Message;

const TOKEN_KEY: &str = "auth_token";

/// Persistent per-session state, shared read-only by consumers.
///
/// The connection sits behind a `Mutex` because rusqlite connections are
/// not `Sync`; contention is negligible at client scale.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    /// Open (and migrate) the session database at the given path.
    pub fn open(path: &Path) -> Result<Self, SessionStoreError> {
        Ok(Self {
            conn: Mutex::new(sqlite::open_store_database(path)?),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, SessionStoreError> {
        Ok(Self {
            conn: Mutex::new(sqlite::open_memory_database()?),
        })
    }

    // ── History ─────────────────────────────────────────────

    /// Persist the complete message list for a session scope.
    ///
    /// Single-statement upsert: the previous snapshot is replaced
    /// atomically.
    pub fn save_history(&self, scope: &str, messages: &[Message]) -> Result<(), SessionStoreError> {
        let blob = serde_json::to_string(messages)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO session_state (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
            params![history_key(scope), blob],
        )?;
        Ok(())
    }

    /// Load the message list for a session scope.
    ///
    /// A missing or unparseable blob yields an empty history.
    pub fn load_history(&self, scope: &str) -> Vec<Message> {
        let blob = match self.read_value(&history_key(scope)) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(scope, error = %e, "Failed to read history blob");
                return Vec::new();
            }
        };

        match serde_json::from_str(&blob) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(scope, error = %e, "Corrupted history blob, treating as empty");
                Vec::new()
            }
        }
    }

    /// Remove the persisted history for a session scope.
    pub fn clear_history(&self, scope: &str) -> Result<(), SessionStoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM session_state WHERE key = ?1",
            params![history_key(scope)],
        )?;
        Ok(())
    }

    // ── Bearer token ────────────────────────────────────────

    pub fn save_token(&self, token: &str) -> Result<(), SessionStoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO session_state (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 updated_at = excluded.updated_at",
            params![TOKEN_KEY, token],
        )?;
        Ok(())
    }

    pub fn load_token(&self) -> Option<String> {
        self.read_value(TOKEN_KEY).ok().flatten()
    }

    pub fn clear_token(&self) -> Result<(), SessionStoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM session_state WHERE key = ?1", params![TOKEN_KEY])?;
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────

    fn read_value(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SessionStoreError> {
        self.conn.lock().map_err(|_| SessionStoreError::LockPoisoned)
    }

    #[cfg(test)]
    pub(crate) fn write_raw(&self, scope: &str, blob: &str) {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO session_state (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![history_key(scope), blob],
        )
        .unwrap();
    }
}

fn history_key(scope: &str) -> String {
    format!("history:{scope}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Message, SourceMetadata, SourceReference};

    fn sample_history() -> Vec<Message> {
        vec![
            Message::user("What does the indemnity clause cover?"),
            Message::assistant(
                "Third-party claims arising from breach.",
                vec![SourceReference {
                    excerpt: "Supplier shall indemnify Customer against...".into(),
                    confidence: Some(84),
                    distance: None,
                    metadata: SourceMetadata {
                        source: Some("msa.pdf".into()),
                        page: Some(12),
                        ..Default::default()
                    },
                }],
                Some(84),
            ),
        ]
    }

    #[test]
    fn history_round_trips_identically() {
        let store = SessionStore::open_in_memory().unwrap();
        let history = sample_history();

        store.save_history("default", &history).unwrap();
        let loaded = store.load_history("default");

        assert_eq!(loaded, history);
    }

    #[test]
    fn missing_history_is_empty() {
        let store = SessionStore::open_in_memory().unwrap();
        assert!(store.load_history("default").is_empty());
    }

    #[test]
    fn corrupted_history_reads_as_empty() {
        let store = SessionStore::open_in_memory().unwrap();
        store.write_raw("default", "{not json at all");
        assert!(store.load_history("default").is_empty());
    }

    #[test]
    fn wrong_shape_history_reads_as_empty() {
        let store = SessionStore::open_in_memory().unwrap();
        store.write_raw("default", r#"{"messages": 3}"#);
        assert!(store.load_history("default").is_empty());
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let store = SessionStore::open_in_memory().unwrap();
        let history = sample_history();

        store.save_history("default", &history[..1]).unwrap();
        store.save_history("default", &history).unwrap();

        assert_eq!(store.load_history("default").len(), 2);
    }

    #[test]
    fn scopes_are_isolated() {
        let store = SessionStore::open_in_memory().unwrap();
        store.save_history("a", &sample_history()).unwrap();

        assert_eq!(store.load_history("a").len(), 2);
        assert!(store.load_history("b").is_empty());
    }

    #[test]
    fn clear_history_removes_blob() {
        let store = SessionStore::open_in_memory().unwrap();
        store.save_history("default", &sample_history()).unwrap();
        store.clear_history("default").unwrap();
        assert!(store.load_history("default").is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = SessionStore::open_in_memory().unwrap();
        store.clear_history("default").unwrap();
        store.clear_history("default").unwrap();
        assert!(store.load_history("default").is_empty());
    }

    #[test]
    fn token_round_trip_and_clear() {
        let store = SessionStore::open_in_memory().unwrap();
        assert!(store.load_token().is_none());

        store.save_token("jwt-abc").unwrap();
        assert_eq!(store.load_token().as_deref(), Some("jwt-abc"));

        store.save_token("jwt-def").unwrap();
        assert_eq!(store.load_token().as_deref(), Some("jwt-def"));

        store.clear_token().unwrap();
        assert!(store.load_token().is_none());
    }

    #[test]
    fn persists_across_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");

        {
            let store = SessionStore::open(&path).unwrap();
            store.save_history("default", &sample_history()).unwrap();
        }

        let store = SessionStore::open(&path).unwrap();
        assert_eq!(store.load_history("default").len(), 2);
    }
}
