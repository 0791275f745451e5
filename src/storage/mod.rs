//! Local persistence for the client session.
//!
//! One small SQLite database holds everything the client keeps between
//! runs: the serialized conversation history (one blob per session scope)
//! and the bearer token. The conversation store is the only writer of
//! history; every other component reads through `SessionStore`.

pub mod session_store;
pub mod sqlite;

pub use session_store::SessionStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Internal lock error")]
    LockPoisoned,
}
