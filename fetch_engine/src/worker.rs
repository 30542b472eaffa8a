//! Per-download worker: one HTTP transfer with resume support and
//! once-per-second progress sampling.

use crate::download::Download;
use crate::errors::DownloadError;
use crate::filename::resolve_file_name;
use futures_util::StreamExt;
use reqwest::header;
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use url::Url;

const REDIRECT_LIMIT: usize = 10;
const PROGRESS_TICK: Duration = Duration::from_secs(1);

/// Executes exactly one fetch attempt against `download`, detached from
/// any caller. Every exit path leaves the record in a terminal state.
pub async fn run(download: Arc<Download>, client: Client) {
    download.mark_running();
    tracing::info!(id = %download.id, url = %download.url, "worker started");

    match transfer(&download, &client).await {
        Ok(()) => {
            download.mark_completed();
            tracing::info!(id = %download.id, bytes = download.done_bytes(), "download completed");
        }
        Err(err) => {
            download.set_error(err.to_string());
            tracing::warn!(id = %download.id, error = %err, "download failed");
        }
    }

    // Completion guard: whatever happened above, never leave `running`.
    download.fail_if_incomplete("download did not complete");
}

async fn transfer(download: &Download, client: &Client) -> Result<(), DownloadError> {
    let url = Url::parse(&download.url)?;
    let response = send_following_redirects(client, url.clone(), 0).await?;
    let effective_url = response.url().clone();

    let file_name = {
        let current = download.file_name();
        if current.is_empty() {
            let content_disposition = response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let resolved = resolve_file_name("", content_disposition.as_deref(), &effective_url)?;
            download.set_file_name(&resolved);
            resolved
        } else {
            current
        }
    };

    fs::create_dir_all(&download.dir).await?;
    let target = download.dir.join(&file_name);

    // A partially written file's size is the sole resume signal.
    let resume_offset = match fs::metadata(&target).await {
        Ok(meta) => meta.len(),
        Err(_) => 0,
    };

    let (response, file) = if resume_offset > 0 {
        // Reissue the request asking for the remainder; the first
        // response is dropped unread.
        let resumed = send_following_redirects(client, url, resume_offset).await?;
        let file = OpenOptions::new().append(true).open(&target).await?;
        (resumed, file)
    } else {
        (response, File::create(&target).await?)
    };

    match response.status() {
        StatusCode::OK | StatusCode::PARTIAL_CONTENT => {}
        status => return Err(DownloadError::UnexpectedStatus(status)),
    }

    // Content-Length on a 206 covers the remainder only.
    let total_bytes = response.content_length().map(|len| resume_offset + len);
    download.begin_transfer(resume_offset, total_bytes);
    if resume_offset > 0 {
        tracing::debug!(id = %download.id, resume_offset, "resuming partial file");
    }

    // Progress ticks are sampled on an independent 1s timer. The
    // capacity-1 channel coalesces: an unconsumed tick makes try_send
    // fail, so ticks are dropped rather than queued.
    let (tick_tx, mut tick_rx) = mpsc::channel::<()>(1);
    let ticker = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PROGRESS_TICK);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(TrySendError::Closed(())) = tick_tx.try_send(()) {
                break;
            }
        }
    });

    let mut file = file;
    let mut stream = response.bytes_stream();
    let result: Result<(), DownloadError> = async {
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            download.add_done_bytes(chunk.len() as u64);
            if tick_rx.try_recv().is_ok() {
                download.update_progress();
            }
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    ticker.abort();
    result
}

/// Sends a GET, following up to [`REDIRECT_LIMIT`] redirects by hand.
///
/// Certain download hosts drop the query string when redirecting; the
/// original query is re-applied to any redirect target that lost it. A
/// `resume_offset` above zero adds a `Range: bytes={offset}-` header.
async fn send_following_redirects(
    client: &Client,
    mut url: Url,
    resume_offset: u64,
) -> Result<Response, DownloadError> {
    let original_query = url.query().map(str::to_owned);

    for _ in 0..=REDIRECT_LIMIT {
        let mut request = client.get(url.clone());
        if resume_offset > 0 {
            request = request.header(header::RANGE, format!("bytes={}-", resume_offset));
        }

        let response = request.send().await?;
        if !response.status().is_redirection() {
            return Ok(response);
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(DownloadError::MissingRedirectLocation)?;
        let mut next = url.join(location)?;
        if next.query().is_none() {
            next.set_query(original_query.as_deref());
        }
        tracing::debug!(from = %url, to = %next, "following redirect");
        url = next;
    }

    Err(DownloadError::TooManyRedirects(REDIRECT_LIMIT))
}
