//! Conversation data model: messages and their source attributions.
//!
//! Messages are immutable once constructed; the store only ever appends
//! them and a session reset drops the whole list. Sources belong to exactly
//! one message; they are never shared across messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

/// Descriptive fields attached to a retrieved passage.
///
/// Every field is optional: absence means "not applicable" for that
/// document, not an error. `h1`–`h3` carry the section hierarchy the
/// indexer extracted, when the document had one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source document title or path as the indexer recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_id: Option<u32>,
}

impl SourceMetadata {
    /// Whether the indexer attached any descriptive field at all.
    pub fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.h1.is_none()
            && self.h2.is_none()
            && self.h3.is_none()
            && self.page.is_none()
            && self.doc_type.is_none()
            && self.split_id.is_none()
    }
}

/// One retrieved passage backing an assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReference {
    /// The retrieved chunk's text.
    pub excerpt: String,
    /// Relevance score 0–100 for this passage. `None` means the backend
    /// did not score it, never defaulted to 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    /// Raw cosine distance (lower = better). Kept for diagnostics only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "SourceMetadata::is_empty")]
    pub metadata: SourceMetadata,
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// UUIDv7: creation-time ordered with a random tie-break, so ids from
    /// the same session sort in creation order.
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    /// Retrieval passages, present only on assistant messages whose answer
    /// had retrieval results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceReference>,
    /// Answer confidence 0–100, present only on assistant messages.
    /// `None` means "no confidence known", which is distinct from 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
}

impl Message {
    /// Create a user message from input text.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            content: content.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            sources: Vec::new(),
            confidence: None,
        }
    }

    /// Create an assistant message with optional attribution.
    pub fn assistant(
        content: impl Into<String>,
        sources: Vec<SourceReference>,
        confidence: Option<u8>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            content: content.into(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
            sources,
            confidence,
        }
    }
}
