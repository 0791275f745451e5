//! Document upload sessions.
//!
//! One `UploadManager` per upload dialog: it admits files against type,
//! size, and count limits, then drives the per-task state machine
//! `pending → uploading → indexing → complete` (with `error` reachable
//! from the two in-flight states) around a single batched backend call.

pub mod manager;

pub use manager::{
    DocumentUploader, FilePayload, UploadLimits, UploadManager, UploadNotice, UploadOutcome,
    UploadStatus, UploadTask,
};

use thiserror::Error;

/// Errors from a batch upload attempt.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The backend rejected or failed the batch; every task that had not
    /// completed carries the same detail.
    #[error("Upload failed: {detail}")]
    BatchFailed { detail: String },
}
