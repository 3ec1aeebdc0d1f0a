//! Store Cleanup Task
//!
//! Background task that periodically purges expired entries from the
//! in-memory store. Memcache expires entries itself; this only matters when
//! mock drivers are in use.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::InMemoryStore;

/// Spawns a background task that periodically purges expired entries.
///
/// # Arguments
/// * `store` - Handle to the shared in-memory store
/// * `cleanup_interval_secs` - Interval in seconds between purges
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(registry.mock_store().clone(), 60);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(store: InMemoryStore, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting store cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.purge_expired();

            if removed > 0 {
                info!("Store cleanup: removed {} expired entries", removed);
            } else {
                debug!("Store cleanup: no expired entries found");
            }
        }
    })
}
