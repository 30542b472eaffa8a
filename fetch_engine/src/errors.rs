use reqwest::StatusCode;
use std::io;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DownloadError {
    /// An error occurred while making an HTTP request.
    #[error("HTTP request failed: {0}")]
    HttpRequestError(#[from] reqwest::Error),

    /// The server answered with something other than 200 or 206.
    #[error("unexpected status: {0}")]
    UnexpectedStatus(StatusCode),

    /// No usable filename from override, Content-Disposition or URL path.
    #[error("filename could not be determined")]
    FilenameUndeterminable,

    /// The download URL (or a redirect target) could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A redirect response carried no usable Location header.
    #[error("redirect without a Location header")]
    MissingRedirectLocation,

    /// The redirect chain exceeded the hop limit.
    #[error("too many redirects (limit {0})")]
    TooManyRedirects(usize),

    /// Failed to create, open or write the destination file.
    #[error("file system error: {0}")]
    FileSystemError(#[from] io::Error),

    /// Retry was requested for an id the registry does not know.
    #[error("unknown download id: {0}")]
    UnknownDownloadId(Uuid),

    /// Retry was requested while a worker for the id is still running.
    #[error("download {0} is still running")]
    AlreadyRunning(Uuid),
}
