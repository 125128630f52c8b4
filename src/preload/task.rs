//! Preload Task Module
//!
//! Defines preload priorities, task definitions and their observable status.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::PerfError;

// == Priority ==
/// Urgency class of a preload task. `High` runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All priorities, most urgent first.
    pub const ORDER: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        f.write_str(name)
    }
}

impl FromStr for Priority {
    type Err = PerfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(PerfError::InvalidRequest(format!(
                "Unknown preload priority '{}'",
                other
            ))),
        }
    }
}

// == Loader ==
/// Zero-argument async loader. The produced value is discarded; loaders that
/// want their data kept write it to a cache themselves.
pub type Loader = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Erases the output type of a value-producing loader.
pub(crate) fn erase_loader<F, Fut, T>(loader: F) -> Loader
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    Arc::new(move || loader().map(|result| result.map(|_| ())).boxed())
}

// == Preload Task ==
/// A registered preload task.
#[derive(Clone)]
pub struct PreloadTask {
    pub id: String,
    pub loader: Loader,
    pub priority: Priority,
    pub loaded: bool,
    pub last_error: Option<String>,
}

impl PreloadTask {
    pub fn new(id: impl Into<String>, loader: Loader, priority: Priority) -> Self {
        Self {
            id: id.into(),
            loader,
            priority,
            loaded: false,
            last_error: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        match (&self.last_error, self.loaded) {
            (_, true) => TaskStatus::Loaded,
            (Some(error), false) => TaskStatus::Failed(error.clone()),
            (None, false) => TaskStatus::Registered,
        }
    }
}

impl fmt::Debug for PreloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadTask")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("loaded", &self.loaded)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

// == Task Status ==
/// Observable state of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum TaskStatus {
    /// Known but not loaded yet, and no attempt has failed
    Registered,
    /// Loader completed successfully
    Loaded,
    /// Last attempt failed with the given error
    Failed(String),
}

// == Preload Summary ==
/// Outcome of one `preload` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreloadSummary {
    /// Tasks whose loader succeeded during this call
    pub loaded: Vec<String>,
    /// Tasks whose loader failed during this call
    pub failed: Vec<String>,
    /// Requested ids that were unknown or already loaded
    pub skipped: Vec<String>,
}
