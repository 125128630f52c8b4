//! Background Tasks Module
//!
//! Optional periodic work around the cache store. Expiry is lazy by default;
//! spawning the sweep bounds memory held by expired entries nobody reads.

mod sweep;

pub use sweep::spawn_sweep_task;
