//! Lexora client core: the browser-independent half of a retrieval-augmented
//! document assistant.
//!
//! Talks to the Lexora backend over HTTP and keeps all session state locally:
//! - `backend`: typed HTTP client, error classification, cold-start wakeup
//! - `chat`: conversation store, answer normalization, source attribution
//! - `upload`: batched document upload with per-file validation
//! - `storage`: SQLite-backed session persistence
//! - `metrics`: stat-card aggregates derived from history
//!
//! The crate is presentation-agnostic: a UI layer subscribes to store events
//! and renders snapshots, it never owns conversation state itself.

pub mod backend;
pub mod chat;
pub mod config;
pub mod metrics;
pub mod models;
pub mod storage;
pub mod upload;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding this crate.
///
/// Honors `RUST_LOG` when set, otherwise falls back to the crate default
/// filter. Call once at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} client core v{}", config::APP_NAME, config::APP_VERSION);
}
