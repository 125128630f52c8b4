//! Perf Layer - client-side performance optimization layer
//!
//! A TTL memory cache with memoization, a priority-ordered preloader with
//! behavior-driven prediction, a chunk loader with load accounting, a query
//! optimizer with result caching and slow-query detection, and a metrics
//! monitor that renders reports.

pub mod api;
pub mod cache;
pub mod chunks;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod preload;
pub mod query;
pub mod tasks;

pub use api::AppState;
pub use config::PerfConfig;
pub use error::{PerfError, Result};
pub use tasks::spawn_sweep_task;
