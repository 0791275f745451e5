//! Per-file upload state machine and batch admission control.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::UploadError;
use crate::backend::{BackendClient, BackendError};
use crate::config;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// A file accepted into the upload session: payload plus original name.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Where a task is in the ingestion pipeline.
///
/// `Complete` and `Error` are terminal within the session; only a
/// `Pending` task may be removed by the user. The error detail lives in
/// the variant so an error state without a reason is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    Uploading,
    Indexing,
    Complete,
    Error { detail: String },
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Complete | UploadStatus::Error { .. })
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, UploadStatus::Uploading | UploadStatus::Indexing)
    }
}

/// One file moving through the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub id: Uuid,
    pub file: FilePayload,
    pub status: UploadStatus,
}

/// A visible, non-fatal admission notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadNotice {
    /// The whole new batch was rejected; existing tasks are untouched.
    BatchLimitExceeded { max: usize },
    /// This file was skipped; the rest of the batch continues.
    UnsupportedType { file: String, extension: String },
    /// This file was skipped; the rest of the batch continues.
    FileTooLarge { file: String, limit: u64 },
}

impl fmt::Display for UploadNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatchLimitExceeded { max } => write!(f, "Maximum {max} files allowed"),
            Self::UnsupportedType { extension, .. } => {
                write!(f, "File type {extension} is not supported")
            }
            Self::FileTooLarge { limit, .. } => {
                write!(f, "File size exceeds {}", config::format_file_size(*limit))
            }
        }
    }
}

/// Outcome of a successful `upload` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// No pending tasks, so nothing was sent.
    NothingPending,
    /// The batch was ingested; `message` is the backend's confirmation.
    Completed { message: String, files: usize },
}

/// Admission limits for one upload session.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_files: usize,
    pub max_file_size: u64,
    pub accepted_types: Vec<String>,
    /// Pause between `indexing` and `complete` so the stage is observable.
    pub settle_delay: Duration,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_files: config::MAX_UPLOAD_FILES,
            max_file_size: config::MAX_UPLOAD_FILE_SIZE,
            accepted_types: config::ACCEPTED_FILE_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            settle_delay: config::INDEXING_SETTLE_DELAY,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Uploader seam
// ═══════════════════════════════════════════════════════════

/// Batch upload seam, implemented by `BackendClient` in production and by
/// fakes in tests.
#[async_trait]
pub trait DocumentUploader: Send + Sync {
    /// Upload all files as one multipart batch; returns the backend's
    /// confirmation message.
    async fn upload_documents(&self, files: Vec<(String, Vec<u8>)>)
        -> Result<String, BackendError>;
}

#[async_trait]
impl DocumentUploader for BackendClient {
    async fn upload_documents(
        &self,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<String, BackendError> {
        BackendClient::upload_documents(self, files).await
    }
}

// ═══════════════════════════════════════════════════════════
// UploadManager
// ═══════════════════════════════════════════════════════════

type BatchCompleteCallback = Box<dyn Fn(usize) + Send + Sync>;

/// Upload session: task list, admission control, batch driver.
pub struct UploadManager {
    tasks: Vec<UploadTask>,
    limits: UploadLimits,
    uploader: Arc<dyn DocumentUploader>,
    /// Fired once per successful batch (not once per file) with the number
    /// of ingested files, so the shell can bump its document-ready count.
    on_batch_complete: Option<BatchCompleteCallback>,
}

impl UploadManager {
    pub fn new(uploader: Arc<dyn DocumentUploader>) -> Self {
        Self::with_limits(uploader, UploadLimits::default())
    }

    pub fn with_limits(uploader: Arc<dyn DocumentUploader>, limits: UploadLimits) -> Self {
        Self {
            tasks: Vec::new(),
            limits,
            uploader,
            on_batch_complete: None,
        }
    }

    /// Register the "documents became available" callback.
    pub fn on_batch_complete(&mut self, callback: impl Fn(usize) + Send + Sync + 'static) {
        self.on_batch_complete = Some(Box::new(callback));
    }

    // ── Read access ─────────────────────────────────────────

    pub fn tasks(&self) -> &[UploadTask] {
        &self.tasks
    }

    /// Whether a batch is currently in flight.
    pub fn is_uploading(&self) -> bool {
        self.tasks.iter().any(|t| t.status.is_in_flight())
    }

    // ── Admission ───────────────────────────────────────────

    /// Admit a batch of files as pending tasks.
    ///
    /// The count limit applies to the batch as a whole: exceeding it
    /// rejects every new file and leaves existing tasks untouched. Type
    /// and size violations are per-file: the offender is skipped with its
    /// own notice while the rest of the batch is admitted.
    pub fn add_files(&mut self, files: Vec<FilePayload>) -> Vec<UploadNotice> {
        let mut notices = Vec::new();

        if self.tasks.len() + files.len() > self.limits.max_files {
            notices.push(UploadNotice::BatchLimitExceeded {
                max: self.limits.max_files,
            });
            return notices;
        }

        for file in files {
            let extension = file_extension(&file.name);
            if !self.limits.accepted_types.contains(&extension) {
                notices.push(UploadNotice::UnsupportedType {
                    file: file.name,
                    extension,
                });
                continue;
            }
            if file.size() > self.limits.max_file_size {
                notices.push(UploadNotice::FileTooLarge {
                    file: file.name,
                    limit: self.limits.max_file_size,
                });
                continue;
            }

            self.tasks.push(UploadTask {
                id: Uuid::new_v4(),
                file,
                status: UploadStatus::Pending,
            });
        }

        notices
    }

    /// Remove a task. Only legal while `pending`; returns whether the task
    /// was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks
            .retain(|t| t.id != id || t.status != UploadStatus::Pending);
        self.tasks.len() < before
    }

    /// Drop all tasks (upload dialog dismissed).
    pub fn reset(&mut self) {
        self.tasks.clear();
    }

    // ── Batch upload ────────────────────────────────────────

    /// Upload every pending task as one batch.
    ///
    /// All pending tasks transition to `uploading` together. On success
    /// they move through `indexing` to `complete` and the batch callback
    /// fires once. On failure, every task not already `complete` moves to
    /// `error` carrying the shared failure detail.
    pub async fn upload(&mut self) -> Result<UploadOutcome, UploadError> {
        let batch: Vec<(String, Vec<u8>)> = self
            .tasks
            .iter()
            .filter(|t| t.status == UploadStatus::Pending)
            .map(|t| (t.file.name.clone(), t.file.bytes.clone()))
            .collect();

        if batch.is_empty() {
            return Ok(UploadOutcome::NothingPending);
        }
        let batch_size = batch.len();

        self.transition_all(UploadStatus::Pending, UploadStatus::Uploading);
        tracing::info!(files = batch_size, "Uploading document batch");

        match self.uploader.upload_documents(batch).await {
            Ok(message) => {
                self.transition_all(UploadStatus::Uploading, UploadStatus::Indexing);
                tokio::time::sleep(self.limits.settle_delay).await;
                self.transition_all(UploadStatus::Indexing, UploadStatus::Complete);

                if let Some(callback) = &self.on_batch_complete {
                    callback(batch_size);
                }

                tracing::info!(files = batch_size, "Document batch ingested");
                Ok(UploadOutcome::Completed {
                    message,
                    files: batch_size,
                })
            }
            Err(e) => {
                let detail = e.to_string();
                for task in &mut self.tasks {
                    if task.status != UploadStatus::Complete {
                        task.status = UploadStatus::Error {
                            detail: detail.clone(),
                        };
                    }
                }
                tracing::warn!(error = %detail, "Document batch upload failed");
                Err(UploadError::BatchFailed { detail })
            }
        }
    }

    fn transition_all(&mut self, from: UploadStatus, to: UploadStatus) {
        for task in &mut self.tasks {
            if task.status == from {
                task.status = to.clone();
            }
        }
    }
}

/// Lowercased extension including the leading dot; a name without a dot
/// yields the whole name so the mismatch notice stays informative.
fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => format!(".{}", ext.to_lowercase()),
        None => format!(".{}", name.to_lowercase()),
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
