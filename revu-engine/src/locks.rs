//! Per-pull-request serialization.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Map of async mutexes keyed by pull request ID.
///
/// Every mutating flow on a pull request holds its guard for the whole flow,
/// so two reassignments of the same pull request cannot interleave. When
/// disabled, `acquire` returns `None` immediately.
///
/// Entries are created on first use. Merging a pull request drops its entry
/// through `release`. A later rejected call on a merged pull request adds
/// the entry back, so the map is bounded by the number of pull requests.
#[derive(Debug, Default)]
pub struct PullRequestLocks {
    enabled: bool,
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl PullRequestLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wait for exclusive access to `pull_request_id`.
    pub async fn acquire(&self, pull_request_id: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }
        let lock = self.get_or_create(pull_request_id).await;
        Some(lock.lock_owned().await)
    }

    /// Forget the mutex for `pull_request_id`.
    ///
    /// Callers still holding or awaiting the old mutex keep it alive until
    /// they finish. Only call this for pull requests that can no longer be
    /// mutated.
    pub async fn release(&self, pull_request_id: &str) {
        if self.enabled {
            self.locks.write().await.remove(pull_request_id);
        }
    }

    #[cfg(test)]
    pub(crate) async fn tracked(&self) -> usize {
        self.locks.read().await.len()
    }

    async fn get_or_create(&self, pull_request_id: &str) -> Arc<Mutex<()>> {
        // Fast path
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(pull_request_id) {
                return lock.clone();
            }
        }

        let mut locks = self.locks.write().await;
        locks
            .entry(pull_request_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
