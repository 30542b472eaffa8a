use crate::download::Download;
use crate::errors::DownloadError;
use crate::registry::Registry;
use crate::types::FetchRequest;
use crate::worker;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Creates download records and launches workers against them.
///
/// Holds the join handle of every launched worker so a retry for a
/// still-running download is rejected instead of double-launched.
pub struct Orchestrator {
    registry: Arc<Registry>,
    client: Client,
    workers: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl Orchestrator {
    /// Redirects are disabled on the shared client; the worker follows
    /// them manually so dropped query strings can be restored.
    pub fn new(registry: Arc<Registry>) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            registry,
            client,
            workers: Mutex::new(HashMap::new()),
        })
    }

    /// Registers a new download and launches its worker. Returns the
    /// fresh id immediately; the record is resolvable via the registry
    /// before this returns.
    pub fn start(&self, request: FetchRequest) -> Uuid {
        let download = Arc::new(Download::new(request));
        let id = download.id;
        self.registry.add(Arc::clone(&download));

        let mut workers = self.lock_workers();
        workers.retain(|_, handle| !handle.is_finished());
        workers.insert(id, tokio::spawn(worker::run(download, self.client.clone())));
        id
    }

    /// Relaunches a worker against an existing record. The worker's
    /// resume logic picks up from whatever the destination file already
    /// holds. Fails for unknown ids and for downloads still in flight.
    pub fn retry(&self, id: Uuid) -> Result<(), DownloadError> {
        let download = self
            .registry
            .get(&id)
            .ok_or(DownloadError::UnknownDownloadId(id))?;

        let mut workers = self.lock_workers();
        if let Some(handle) = workers.get(&id) {
            if !handle.is_finished() {
                return Err(DownloadError::AlreadyRunning(id));
            }
        }

        download.clear_error();
        tracing::info!(id = %id, "retrying download");
        workers.retain(|_, handle| !handle.is_finished());
        workers.insert(id, tokio::spawn(worker::run(download, self.client.clone())));
        Ok(())
    }

    fn lock_workers(&self) -> MutexGuard<'_, HashMap<Uuid, JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
