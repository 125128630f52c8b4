//! Preload Module
//!
//! Priority-scheduled preloading and the behavior-driven layer on top of it.

mod preloader;
mod smart;
mod task;

pub use preloader::Preloader;
pub use smart::{
    registration_flow_patterns, BehaviorEvent, BehaviorPattern, SmartPreloader,
    DEFAULT_BEHAVIOR_WINDOW,
};
pub use task::{Loader, PreloadSummary, PreloadTask, Priority, TaskStatus};
