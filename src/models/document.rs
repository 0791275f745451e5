//! Corpus document records as reported by the backend listing endpoint.

use serde::{Deserialize, Serialize};

/// One indexed document in the backend corpus.
///
/// Read-only on the client: creation happens through upload ingestion,
/// removal through the delete endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub chunks_count: u32,
    #[serde(default)]
    pub file_size_bytes: u64,
    #[serde(default)]
    pub status: Option<String>,
}
