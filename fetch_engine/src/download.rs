use crate::types::{DownloadStatus, FetchRequest};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Progress value reported while the total size is unknown.
pub const PROGRESS_UNKNOWN: f64 = -1.0;

/// One fetch attempt identity: immutable target plus live transfer state.
///
/// The identity fields never change after creation; everything the worker
/// mutates lives behind a single per-record mutex so a snapshot is always
/// internally consistent, while the registry lock stays a separate concern.
#[derive(Debug)]
pub struct Download {
    /// Unique identifier, used as the registry key and the external handle.
    pub id: Uuid,
    /// Source URL.
    pub url: String,
    /// Destination directory.
    pub dir: PathBuf,
    /// When the download was added.
    pub created_at: DateTime<Utc>,
    state: Mutex<DownloadState>,
}

#[derive(Debug)]
struct DownloadState {
    file_name: String,
    status: DownloadStatus,
    progress: f64,
    error: String,
    total_bytes: u64,
    done_bytes: u64,
}

/// Point-in-time copy of a record, taken under the record lock.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadSnapshot {
    pub id: Uuid,
    pub url: String,
    pub file_name: String,
    pub path: PathBuf,
    pub status: DownloadStatus,
    pub progress: f64,
    pub error: String,
    pub total_bytes: u64,
    pub done_bytes: u64,
    pub created_at: DateTime<Utc>,
}

impl Download {
    pub fn new(request: FetchRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: request.url,
            dir: request.dir,
            created_at: Utc::now(),
            state: Mutex::new(DownloadState {
                file_name: request.file_name.unwrap_or_default(),
                status: DownloadStatus::Pending,
                progress: 0.0,
                error: String::new(),
                total_bytes: 0,
                done_bytes: 0,
            }),
        }
    }

    // Poisoned locks are taken over; there is no partial state to protect.
    fn lock(&self) -> MutexGuard<'_, DownloadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> DownloadStatus {
        self.lock().status
    }

    pub fn file_name(&self) -> String {
        self.lock().file_name.clone()
    }

    pub fn set_file_name(&self, name: &str) {
        self.lock().file_name = name.to_string();
    }

    pub fn done_bytes(&self) -> u64 {
        self.lock().done_bytes
    }

    /// Marks the record as actively transferring.
    pub fn mark_running(&self) {
        self.lock().status = DownloadStatus::Running;
    }

    /// Terminal success: every byte of the body has been written out.
    pub fn mark_completed(&self) {
        let mut state = self.lock();
        state.status = DownloadStatus::Completed;
        state.progress = 100.0;
        state.error.clear();
    }

    /// Records a failure reason without touching the status; the completion
    /// guard turns it into a terminal `Failed` when the worker returns.
    pub fn set_error(&self, reason: impl Into<String>) {
        self.lock().error = reason.into();
    }

    pub fn clear_error(&self) {
        self.lock().error.clear();
    }

    /// Completion guard: a terminated worker must never leave its record
    /// in `running`. Any non-completed exit becomes `Failed`.
    pub fn fail_if_incomplete(&self, fallback_reason: &str) {
        let mut state = self.lock();
        if state.status != DownloadStatus::Completed {
            state.status = DownloadStatus::Failed;
            if state.error.is_empty() {
                state.error = fallback_reason.to_string();
            }
        }
    }

    /// Seeds the byte counters from a partially written file. Resets the
    /// total so a re-run against a changed resource recomputes it.
    pub fn begin_transfer(&self, resume_offset: u64, total_bytes: Option<u64>) {
        let mut state = self.lock();
        state.done_bytes = resume_offset;
        state.total_bytes = total_bytes.unwrap_or(0);
        state.progress = if state.total_bytes > 0 {
            state.done_bytes as f64 / state.total_bytes as f64 * 100.0
        } else {
            PROGRESS_UNKNOWN
        };
    }

    pub fn add_done_bytes(&self, bytes: u64) {
        self.lock().done_bytes += bytes;
    }

    /// Recomputes the progress percentage from the byte counters.
    pub fn update_progress(&self) {
        let mut state = self.lock();
        if state.total_bytes > 0 {
            state.progress = state.done_bytes as f64 / state.total_bytes as f64 * 100.0;
        } else {
            state.progress = PROGRESS_UNKNOWN;
        }
    }

    pub fn snapshot(&self) -> DownloadSnapshot {
        let state = self.lock();
        DownloadSnapshot {
            id: self.id,
            url: self.url.clone(),
            file_name: state.file_name.clone(),
            path: self.dir.clone(),
            status: state.status,
            progress: state.progress,
            error: state.error.clone(),
            total_bytes: state.total_bytes,
            done_bytes: state.done_bytes,
            created_at: self.created_at,
        }
    }
}
