//! Expired-entry sweep task.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a task that removes expired entries from `cache` every
/// `interval_ms` milliseconds.
///
/// Returns None without spawning when `interval_ms` is zero. The returned
/// handle is aborted on shutdown.
pub fn spawn_sweep_task<V>(cache: SharedCache<V>, interval_ms: u64) -> Option<JoinHandle<()>>
where
    V: Clone + Send + Sync + 'static,
{
    if interval_ms == 0 {
        return None;
    }
    let interval = Duration::from_millis(interval_ms);

    Some(tokio::spawn(async move {
        info!("Starting cache sweep task with interval of {} ms", interval_ms);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();

            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{shared, CacheStore};
    use serde_json::json;

    #[tokio::test]
    async fn test_sweep_removes_unread_expired_entries() {
        let cache = shared(CacheStore::new(100));
        cache.write().await.set("expire_soon", json!("value"), Some(20));
        cache.write().await.set("long_lived", json!("value"), Some(60_000));

        let handle = spawn_sweep_task(cache.clone(), 30).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        {
            let guard = cache.read().await;
            assert_eq!(guard.len(), 1, "sweep removed the expired entry without a read");
            assert_eq!(guard.stats().miss_count, 0);
        }
        assert_eq!(cache.write().await.get("long_lived"), Some(json!("value")));

        handle.abort();
    }

    #[tokio::test]
    async fn test_zero_interval_disables_sweep() {
        let cache = shared(CacheStore::<serde_json::Value>::new(10));
        assert!(spawn_sweep_task(cache, 0).is_none());
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let cache = shared(CacheStore::<serde_json::Value>::new(10));
        let handle = spawn_sweep_task(cache, 10).unwrap();

        handle.abort();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(handle.is_finished());
    }
}
