use serde::Serialize;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl DownloadStatus {
    /// Whether the download has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Completed | DownloadStatus::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Source URL to fetch.
    pub url: String,
    /// Destination filename; resolved from the response when `None`.
    pub file_name: Option<String>,
    /// Destination directory.
    pub dir: PathBuf,
}
