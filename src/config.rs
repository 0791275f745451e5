//! Application-level constants and configuration.
//!
//! Fixed policy values (optimistic default confidence, fallback answer text,
//! no-answer sentinel) are carried over from the deployed product verbatim;
//! changing them changes user-visible behavior.

use std::path::PathBuf;
use std::time::Duration;

pub const APP_NAME: &str = "Lexora";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default backend URL when `LEXORA_BACKEND_URL` is not set.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Answer text substituted when the backend response carries no answer field.
pub const FALLBACK_ANSWER: &str = "Could not process the query.";

/// Message-level confidence assumed when the backend omits one.
///
/// Optimistic default, not a measurement. The backend usually omits
/// confidence only on direct-generation answers that skipped retrieval
/// scoring, which in practice are high-confidence paths.
pub const DEFAULT_CONFIDENCE: u8 = 96;

/// Phrase (matched case-insensitively) marking a "no relevant information"
/// answer. Such messages show neither a confidence badge nor sources.
pub const NO_ANSWER_SENTINEL: &str = "i don't have that information";

/// Maximum number of upload tasks held by one upload session.
pub const MAX_UPLOAD_FILES: usize = 10;

/// Maximum size of a single uploaded file: 25 MB.
pub const MAX_UPLOAD_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// File extensions accepted for ingestion (lowercase, with leading dot).
pub const ACCEPTED_FILE_TYPES: &[&str] = &[".pdf"];

/// Pause between the `indexing` and `complete` upload states, so the
/// indexing stage is observable in the task list.
pub const INDEXING_SETTLE_DELAY: Duration = Duration::from_millis(800);

/// Backend wakeup poll: attempts and spacing (~3 minutes total).
pub const WAKEUP_MAX_ATTEMPTS: u32 = 60;
pub const WAKEUP_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const WAKEUP_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve the backend base URL from the environment, trimming any
/// trailing slash so endpoint paths can be appended directly.
pub fn backend_url() -> String {
    std::env::var("LEXORA_BACKEND_URL")
        .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Get the application data directory: ~/Lexora/ on all platforms.
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Lexora")
}

/// Path of the session database (history blobs + auth token).
pub fn session_db_path() -> PathBuf {
    app_data_dir().join("session.db")
}

/// Default log filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Format a byte count for notices: 1024 base, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = (value * 100.0).round() / 100.0;
    if (rounded - rounded.trunc()).abs() < f64::EPSILON {
        format!("{} {}", rounded.trunc() as u64, UNITS[exp])
    } else {
        format!("{} {}", rounded, UNITS[exp])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Lexora"));
    }

    #[test]
    fn session_db_under_app_data() {
        let db = session_db_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("session.db"));
    }

    #[test]
    fn backend_url_has_no_trailing_slash() {
        let url = backend_url();
        assert!(!url.ends_with('/'));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn format_file_size_units() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(25 * 1024 * 1024), "25 MB");
        assert_eq!(format_file_size(1536), "1.5 KB");
    }

    #[test]
    fn accepted_types_are_lowercase_with_dot() {
        for ext in ACCEPTED_FILE_TYPES {
            assert!(ext.starts_with('.'));
            assert_eq!(**ext, ext.to_lowercase());
        }
    }
}
