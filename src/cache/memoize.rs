//! Memoization Module
//!
//! Wraps an async function so its successful results are stored in a shared
//! [`CacheStore`] under a caller-derived key.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::CacheStore;

/// Cache store shared between the components that read and populate it.
pub type SharedCache<V = Value> = Arc<RwLock<CacheStore<V>>>;

/// Wraps a store for sharing.
pub fn shared<V>(store: CacheStore<V>) -> SharedCache<V> {
    Arc::new(RwLock::new(store))
}

// == Memoized ==
/// An async function whose results are served from a cache when possible.
///
/// Concurrent calls with the same key that start before the first one
/// finishes each invoke the wrapped function; there is no single-flight
/// deduplication.
pub struct Memoized<V, F, K> {
    cache: SharedCache<V>,
    func: F,
    key_fn: K,
    ttl_ms: TtlChoice,
}

#[derive(Debug, Clone, Copy)]
enum TtlChoice {
    StoreDefault,
    Fixed(Option<u64>),
}

/// Wraps `func` so results are cached under `key_fn(&args)`.
///
/// Stored results use the store's default TTL unless the wrapper is
/// reconfigured with [`Memoized::with_ttl`]. Errors are returned as-is and
/// never cached.
///
/// # Example
/// ```ignore
/// let events = with_cache(cache.clone(), fetch_event, |id: &u64| format!("event:{}", id));
/// let event = events.call(42).await?;
/// ```
pub fn with_cache<V, F, K>(cache: SharedCache<V>, func: F, key_fn: K) -> Memoized<V, F, K> {
    Memoized {
        cache,
        func,
        key_fn,
        ttl_ms: TtlChoice::StoreDefault,
    }
}

impl<V, F, K> Memoized<V, F, K>
where
    V: Clone,
{
    /// Overrides the TTL of stored results; None stores them without expiry.
    pub fn with_ttl(mut self, ttl_ms: Option<u64>) -> Self {
        self.ttl_ms = TtlChoice::Fixed(ttl_ms);
        self
    }

    /// Calls the wrapped function, or answers from the cache.
    pub async fn call<A, E, Fut>(&self, args: A) -> std::result::Result<V, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
        K: Fn(&A) -> String,
    {
        let key = (self.key_fn)(&args);

        let cached = self.cache.write().await.get(&key);
        if let Some(value) = cached {
            debug!(key = %key, "Memoized call served from cache");
            return Ok(value);
        }

        let value = (self.func)(args).await?;

        let mut cache = self.cache.write().await;
        let ttl_ms = match self.ttl_ms {
            TtlChoice::StoreDefault => cache.default_ttl_ms(),
            TtlChoice::Fixed(ttl) => ttl,
        };
        cache.set(key, value.clone(), ttl_ms);

        Ok(value)
    }
}
