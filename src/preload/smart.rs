//! Smart Preloader Module
//!
//! Watches the user's recent actions and preloads the tasks a known action
//! sequence says will be needed next.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::debug;

use crate::cache::current_timestamp_ms;
use crate::preload::{Preloader, PreloadSummary};

/// Default length of the behavior window.
pub const DEFAULT_BEHAVIOR_WINDOW: usize = 10;

// == Behavior Event ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BehaviorEvent {
    pub action: String,
    /// Unix milliseconds
    pub timestamp: u64,
}

// == Behavior Pattern ==
/// When the most recent actions equal `trigger`, the tasks in `preload` are
/// started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorPattern {
    pub trigger: Vec<String>,
    pub preload: Vec<String>,
}

impl BehaviorPattern {
    pub fn new<T, P>(trigger: T, preload: P) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            trigger: trigger.into_iter().map(Into::into).collect(),
            preload: preload.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, log: &VecDeque<BehaviorEvent>) -> bool {
        if self.trigger.is_empty() || self.trigger.len() > log.len() {
            return false;
        }
        log.iter()
            .skip(log.len() - self.trigger.len())
            .zip(&self.trigger)
            .all(|(event, action)| event.action == *action)
    }
}

/// Patterns of the event registration flow.
pub fn registration_flow_patterns() -> Vec<BehaviorPattern> {
    vec![
        BehaviorPattern::new(
            ["view_events", "select_event"],
            ["registration-form", "identity-selection"],
        ),
        BehaviorPattern::new(
            ["select_event", "open_registration"],
            ["ticket-types", "checkout"],
        ),
        BehaviorPattern::new(["complete_registration"], ["confirmation", "messaging"]),
    ]
}

// == Smart Preloader ==
pub struct SmartPreloader {
    preloader: Arc<Preloader>,
    window: usize,
    log: Mutex<VecDeque<BehaviorEvent>>,
    patterns: RwLock<Vec<BehaviorPattern>>,
}

impl SmartPreloader {
    /// Creates a smart preloader over `preloader` with the registration flow
    /// patterns installed.
    pub fn new(preloader: Arc<Preloader>, window: usize) -> Self {
        let window = window.max(1);
        Self {
            preloader,
            window,
            log: Mutex::new(VecDeque::with_capacity(window)),
            patterns: RwLock::new(registration_flow_patterns()),
        }
    }

    /// Replaces the installed patterns.
    pub fn with_patterns(self, patterns: Vec<BehaviorPattern>) -> Self {
        *self.patterns.write() = patterns;
        self
    }

    pub fn add_pattern(&self, pattern: BehaviorPattern) {
        self.patterns.write().push(pattern);
    }

    pub fn preloader(&self) -> &Arc<Preloader> {
        &self.preloader
    }

    // == Record Behavior ==
    /// Appends an action to the window and preloads whatever it predicts.
    ///
    /// Returns the outcome of the triggered preload; an empty summary when
    /// nothing was predicted.
    pub async fn record_behavior(&self, action: impl Into<String>) -> PreloadSummary {
        let action = action.into();
        let predicted = {
            let mut log = self.log.lock();
            log.push_back(BehaviorEvent {
                action: action.clone(),
                timestamp: current_timestamp_ms(),
            });
            while log.len() > self.window {
                log.pop_front();
            }
            self.predict_from(&log)
        };

        if predicted.is_empty() {
            return PreloadSummary::default();
        }

        debug!(action = %action, tasks = ?predicted, "Behavior pattern matched, preloading");
        self.preloader.preload(&predicted).await
    }

    /// Tasks the current window predicts, without running them.
    pub fn predict(&self) -> Vec<String> {
        self.predict_from(&self.log.lock())
    }

    pub fn recent_actions(&self) -> Vec<BehaviorEvent> {
        self.log.lock().iter().cloned().collect()
    }

    pub fn clear_behavior(&self) {
        self.log.lock().clear();
    }

    fn predict_from(&self, log: &VecDeque<BehaviorEvent>) -> Vec<String> {
        let mut predicted: Vec<String> = Vec::new();
        for pattern in self.patterns.read().iter().filter(|p| p.matches(log)) {
            for id in &pattern.preload {
                if !predicted.contains(id) {
                    predicted.push(id.clone());
                }
            }
        }
        predicted
    }
}
