//! Preloader Module
//!
//! Priority-ordered async task runner. Every `high` task of a call starts
//! before any `medium` one, and every `medium` before any `low`; tasks of one
//! priority run concurrently on the caller's task.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::future::join_all;
use futures::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::preload::task::{erase_loader, Loader, PreloadSummary, PreloadTask, Priority, TaskStatus};

// == Preloader ==
/// Registry of preload tasks and their load state.
#[derive(Debug, Default)]
pub struct Preloader {
    tasks: RwLock<HashMap<String, PreloadTask>>,
}

impl Preloader {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Registers or replaces a task definition.
    ///
    /// Replacing a task that already loaded keeps it loaded.
    pub fn register<F, Fut, T>(&self, id: impl Into<String>, loader: F, priority: Priority)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.register_loader(id, erase_loader(loader), priority);
    }

    /// Registers a task from an already type-erased loader.
    pub fn register_loader(&self, id: impl Into<String>, loader: Loader, priority: Priority) {
        let id = id.into();
        let mut tasks = self.tasks.write();
        let was_loaded = tasks.get(&id).is_some_and(|task| task.loaded);

        let mut task = PreloadTask::new(id.clone(), loader, priority);
        task.loaded = was_loaded;
        debug!(task = %id, priority = %priority, "Registered preload task");
        tasks.insert(id, task);
    }

    // == Preload ==
    /// Runs the named tasks that are registered and not yet loaded.
    ///
    /// Never fails: loader errors and panics are recorded on their task and
    /// reported in the returned summary.
    pub async fn preload<S: AsRef<str>>(&self, ids: &[S]) -> PreloadSummary {
        let mut summary = PreloadSummary::default();
        let mut seen = HashSet::new();
        let mut batches: HashMap<Priority, Vec<(String, Loader)>> = HashMap::new();

        {
            let tasks = self.tasks.read();
            for id in ids.iter().map(AsRef::as_ref) {
                if !seen.insert(id) {
                    continue;
                }
                match tasks.get(id) {
                    Some(task) if !task.loaded => batches
                        .entry(task.priority)
                        .or_default()
                        .push((task.id.clone(), task.loader.clone())),
                    _ => summary.skipped.push(id.to_string()),
                }
            }
        }

        for priority in Priority::ORDER {
            let Some(batch) = batches.remove(&priority) else {
                continue;
            };
            debug!(priority = %priority, tasks = batch.len(), "Starting preload batch");

            let outcomes = join_all(batch.into_iter().map(|(id, loader)| async move {
                // A loader may panic while building its future as well as
                // while running it
                let outcome = match panic::catch_unwind(AssertUnwindSafe(|| loader())) {
                    Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                    Err(payload) => Err(payload),
                };
                let result = match outcome {
                    Ok(result) => result.map_err(|e| format!("{:#}", e)),
                    Err(_) => Err("loader panicked".to_string()),
                };
                (id, result)
            }))
            .await;

            let mut tasks = self.tasks.write();
            for (id, result) in outcomes {
                match result {
                    Ok(()) => {
                        if let Some(task) = tasks.get_mut(&id) {
                            task.loaded = true;
                            task.last_error = None;
                        }
                        summary.loaded.push(id);
                    }
                    Err(error) => {
                        warn!(task = %id, error = %error, "Preload task failed");
                        if let Some(task) = tasks.get_mut(&id) {
                            task.last_error = Some(error);
                        }
                        summary.failed.push(id);
                    }
                }
            }
        }

        if !summary.loaded.is_empty() || !summary.failed.is_empty() {
            info!(
                "Preload finished: {} loaded, {} failed, {} skipped",
                summary.loaded.len(),
                summary.failed.len(),
                summary.skipped.len()
            );
        }
        summary
    }

    /// Runs every registered task that is not loaded yet.
    pub async fn preload_all(&self) -> PreloadSummary {
        let ids = self.registered_ids();
        self.preload(&ids).await
    }

    // == Queries ==
    /// Returns true once the task's loader has succeeded.
    pub fn is_loaded(&self, id: &str) -> bool {
        self.tasks.read().get(id).is_some_and(|task| task.loaded)
    }

    /// Returns the task's status, or None if it is not registered.
    pub fn status(&self, id: &str) -> Option<TaskStatus> {
        self.tasks.read().get(id).map(PreloadTask::status)
    }

    /// Registered ids, sorted.
    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tasks.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// Returns true if no task is registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    // == Clear ==
    /// Forgets every task.
    pub fn clear(&self) {
        self.tasks.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        name: &'static str,
        delay_ms: u64,
    ) -> impl Fn() -> futures::future::BoxFuture<'static, anyhow::Result<()>> + Send + Sync + 'static
    {
        let log = log.clone();
        move || {
            let log = log.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                log.lock().push(name.to_string());
                Ok(())
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_high_priority_runs_before_low() {
        let preloader = Preloader::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        // The low task would finish first if both ran together
        preloader.register("low-priority", recorder(&log, "low", 0), Priority::Low);
        preloader.register("high-priority", recorder(&log, "high", 30), Priority::High);

        let summary = preloader.preload(&["low-priority", "high-priority"]).await;

        assert_eq!(*log.lock(), vec!["high".to_string(), "low".to_string()]);
        assert_eq!(summary.loaded, vec!["high-priority", "low-priority"]);
        assert!(preloader.is_loaded("high-priority"));
        assert!(preloader.is_loaded("low-priority"));
    }

    #[tokio::test]
    async fn test_medium_between_high_and_low() {
        let preloader = Preloader::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        preloader.register("l", recorder(&log, "low", 0), Priority::Low);
        preloader.register("m", recorder(&log, "medium", 10), Priority::Medium);
        preloader.register("h", recorder(&log, "high", 20), Priority::High);

        preloader.preload(&["l", "m", "h"]).await;

        assert_eq!(*log.lock(), vec!["high", "medium", "low"]);
    }

    #[tokio::test]
    async fn test_failing_task_is_recorded_not_raised() {
        let preloader = Preloader::new();
        preloader.register(
            "broken",
            || async { Err::<(), _>(anyhow::anyhow!("network down")) },
            Priority::High,
        );
        preloader.register("fine", || async { Ok(42u32) }, Priority::High);

        let summary = preloader.preload(&["broken", "fine"]).await;

        assert!(!preloader.is_loaded("broken"));
        assert!(preloader.is_loaded("fine"));
        assert_eq!(summary.failed, vec!["broken"]);
        assert_eq!(
            preloader.status("broken"),
            Some(TaskStatus::Failed("network down".to_string()))
        );
    }

    #[tokio::test]
    async fn test_panicking_loader_is_contained() {
        let preloader = Preloader::new();
        preloader.register(
            "panics",
            || async {
                if true {
                    panic!("loader bug");
                }
                Ok::<(), anyhow::Error>(())
            },
            Priority::Medium,
        );

        let summary = preloader.preload(&["panics"]).await;

        assert_eq!(summary.failed, vec!["panics"]);
        assert!(!preloader.is_loaded("panics"));
    }

    #[tokio::test]
    async fn test_loader_panicking_before_its_future_is_contained() {
        let preloader = Preloader::new();
        preloader.register(
            "sync-panic",
            || -> futures::future::Ready<anyhow::Result<()>> { panic!("bad loader setup") },
            Priority::High,
        );
        preloader.register("sibling", || async { Ok(()) }, Priority::High);

        let summary = preloader.preload(&["sync-panic", "sibling"]).await;

        assert_eq!(summary.failed, vec!["sync-panic"]);
        assert_eq!(summary.loaded, vec!["sibling"]);
        assert!(!preloader.is_loaded("sync-panic"));
        assert!(preloader.is_loaded("sibling"));
        assert_eq!(
            preloader.status("sync-panic"),
            Some(TaskStatus::Failed("loader panicked".to_string()))
        );
    }

    #[tokio::test]
    async fn test_loaded_tasks_are_not_rerun() {
        let preloader = Preloader::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        preloader.register(
            "once",
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
            Priority::Low,
        );

        preloader.preload(&["once"]).await;
        let summary = preloader.preload(&["once", "unknown"]).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(summary.skipped, vec!["once", "unknown"]);
    }

    #[tokio::test]
    async fn test_reregister_preserves_loaded() {
        let preloader = Preloader::new();
        preloader.register("t", || async { Ok(()) }, Priority::Low);
        preloader.preload(&["t"]).await;

        preloader.register("t", || async { Ok(()) }, Priority::High);

        assert!(preloader.is_loaded("t"));
        assert_eq!(preloader.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_and_preload_all() {
        let preloader = Preloader::new();
        preloader.register("a", || async { Ok(()) }, Priority::Low);
        preloader.register("b", || async { Ok(()) }, Priority::High);

        let summary = preloader.preload_all().await;
        assert_eq!(summary.loaded.len(), 2);

        preloader.clear();
        assert!(preloader.is_empty());
        assert!(!preloader.is_loaded("a"));
        assert_eq!(preloader.status("a"), None);
    }
}
