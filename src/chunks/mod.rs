//! Code-Splitting Module
//!
//! Runs deferred chunk loaders and counts how many succeed and fail.

mod manager;

pub use manager::{ChunkLoadStats, ChunkSource, CodeSplittingManager, CHUNK_LOAD_METRIC};
