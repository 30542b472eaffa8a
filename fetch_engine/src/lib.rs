pub mod download;
pub mod errors;
pub mod filename;
pub mod orchestrator;
pub mod registry;
pub mod types;
pub mod worker;

pub use download::{Download, DownloadSnapshot, PROGRESS_UNKNOWN};
pub use errors::DownloadError;
pub use orchestrator::Orchestrator;
pub use registry::Registry;
pub use types::{DownloadStatus, FetchRequest};
