use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::types::CacheStore;

/// Periodically delete expired entries from `store`.
///
/// The task holds a weak reference and ends once the store is dropped.
pub fn spawn_expiry_sweeper(store: &Arc<dyn CacheStore>, every: Duration) -> JoinHandle<()> {
    let store: Weak<dyn CacheStore> = Arc::downgrade(store);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(store) = store.upgrade() else {
                tracing::debug!("Session store dropped, stopping expiry sweeper");
                break;
            };

            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!("Purged {} expired session entries", purged),
                Err(e) => tracing::warn!("Failed to purge expired session entries: {}", e),
            }
        }
    })
}
