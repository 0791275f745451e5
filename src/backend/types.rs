//! Wire types for the backend API.
//!
//! Every field the backend may omit is optional or defaulted here; shape
//! tolerance lives in these structs so the rest of the crate works with
//! fully-typed values.

use serde::{Deserialize, Serialize};

use crate::models::{DocumentInfo, SourceMetadata};

/// Body for `POST /chat/answer`.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRequest<'a> {
    pub query: &'a str,
}

/// Response of `POST /chat/answer`. All fields are optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerPayload {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Vec<RawSource>,
    /// Fraction in [0, 1] when present.
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// One raw retrieval hit inside an answer payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSource {
    #[serde(default)]
    pub document_id: Option<serde_json::Value>,
    #[serde(default)]
    pub text: Option<String>,
    /// Fraction in [0, 1] when present.
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub cosine_distance: Option<f64>,
    #[serde(default)]
    pub metadata: SourceMetadata,
}

/// Response of `GET /documents`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentsPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub documents: Vec<DocumentInfo>,
}

/// Error payload shape shared by all endpoints: `{ detail }` from the
/// framework, `{ message }` from application handlers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Pick the most specific error text: `detail`, then `message`,
    /// then the caller's fallback (usually the HTTP status line).
    pub fn into_message(self, fallback: &str) -> String {
        self.detail
            .or(self.message)
            .unwrap_or_else(|| fallback.to_string())
    }
}
