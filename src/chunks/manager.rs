//! Code-Splitting Manager
//!
//! Import failures are counted and logged, never returned.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::monitor::PerformanceMonitor;

/// Metric name used for chunk load durations, in milliseconds.
pub const CHUNK_LOAD_METRIC: &str = "chunk_load_time";

// == Chunk Source ==
/// Resolves a module value from a chunk identifier.
pub trait ChunkSource: Send + Sync {
    type Module: Send;

    fn load<'a>(&'a self, id: &'a str) -> BoxFuture<'a, anyhow::Result<Self::Module>>;
}

// == Chunk Load Stats ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkLoadStats {
    pub loaded_chunks: u64,
    pub failed_chunks: u64,
}

// == Code-Splitting Manager ==
#[derive(Debug, Default)]
pub struct CodeSplittingManager {
    loaded_chunks: AtomicU64,
    failed_chunks: AtomicU64,
    monitor: Option<Arc<PerformanceMonitor>>,
}

impl CodeSplittingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports every chunk load duration to `monitor`.
    pub fn with_monitor(mut self, monitor: Arc<PerformanceMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    // == Preload Chunk ==
    /// Runs one import, returning the module on success and None on failure.
    pub async fn preload_chunk<F, Fut, M>(&self, import_fn: F) -> Option<M>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<M>>,
    {
        let started = Instant::now();
        let result = import_fn().await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if let Some(monitor) = &self.monitor {
            monitor.record_metric(CHUNK_LOAD_METRIC, elapsed_ms);
        }

        match result {
            Ok(module) => {
                self.loaded_chunks.fetch_add(1, Ordering::Relaxed);
                debug!(elapsed_ms, "Chunk loaded");
                Some(module)
            }
            Err(e) => {
                self.failed_chunks.fetch_add(1, Ordering::Relaxed);
                warn!(error = %format!("{:#}", e), "Chunk load failed");
                None
            }
        }
    }

    // == Preload Chunks ==
    /// Runs all imports concurrently; results keep the input order.
    pub async fn preload_chunks<I, F, Fut, M>(&self, import_fns: I) -> Vec<Option<M>>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<M>>,
    {
        join_all(
            import_fns
                .into_iter()
                .map(|import_fn| self.preload_chunk(import_fn)),
        )
        .await
    }

    /// Loads named chunks from a source, concurrently.
    pub async fn preload_named<S: ChunkSource>(
        &self,
        source: &S,
        ids: &[&str],
    ) -> Vec<Option<S::Module>> {
        self.preload_chunks(ids.iter().map(|id| move || source.load(id)))
            .await
    }

    // == Stats ==
    pub fn stats(&self) -> ChunkLoadStats {
        ChunkLoadStats {
            loaded_chunks: self.loaded_chunks.load(Ordering::Relaxed),
            failed_chunks: self.failed_chunks.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        self.loaded_chunks.store(0, Ordering::Relaxed);
        self.failed_chunks.store(0, Ordering::Relaxed);
    }
}
