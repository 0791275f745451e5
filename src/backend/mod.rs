//! Backend HTTP boundary.
//!
//! Everything the client consumes from the remote RAG service goes through
//! this module: answer generation, document CRUD, liveness, and session
//! checks. Failures never cross this boundary as raw transport errors;
//! they are mapped to `BackendError`, which callers turn into typed,
//! user-displayable outcomes.

pub mod client;
pub mod types;
pub mod wakeup;

pub use client::BackendClient;
pub use types::{AnswerPayload, DocumentsPage, RawSource};
pub use wakeup::wait_for_backend;

use thiserror::Error;

/// Errors from backend calls, already classified for the caller.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Cannot reach the backend at {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Session expired, sign in again")]
    Unauthorized,

    /// Non-2xx response with the backend's own error text
    /// (`detail` preferred over `message`, falling back to the status line).
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response from the backend: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BackendError {
    /// Whether the only recovery is re-authentication.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, BackendError::Unauthorized)
    }
}
