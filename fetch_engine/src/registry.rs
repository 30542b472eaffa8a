use crate::download::Download;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Identifier-keyed store of download records, shared by workers and
/// pollers. The lock guards only the map itself; the fields inside each
/// record are protected by the record's own mutex.
#[derive(Debug, Default)]
pub struct Registry {
    downloads: RwLock<HashMap<Uuid, Arc<Download>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under its id, silently replacing any previous
    /// entry. Id uniqueness is the orchestrator's responsibility.
    pub fn add(&self, download: Arc<Download>) {
        let mut map = self
            .downloads
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        map.insert(download.id, download);
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Download>> {
        let map = self
            .downloads
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        map.get(id).cloned()
    }

    /// Snapshot list of every stored record, in no particular order.
    pub fn get_all(&self) -> Vec<Arc<Download>> {
        let map = self
            .downloads
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        map.values().cloned().collect()
    }

    /// Removes every entry. Workers still holding an `Arc` to a removed
    /// record keep mutating it; it just becomes unreachable from here.
    pub fn clear(&self) {
        let mut map = self
            .downloads
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        map.clear();
    }
}
