//! Recipe status reporting
//!
//! This module provides the `StatusSubscriber` trait for receiving
//! "recipe detected" and "recipe unsupported" notifications, and the
//! `StatusReporter` that fans them out to every registered subscriber.
//!
//! # Example
//!
//! ```rust
//! use preflight_filter::{RecipeStatusEvent, StatusReporter, StatusSubscriber};
//! use std::sync::Arc;
//!
//! struct InstallLog;
//!
//! impl StatusSubscriber for InstallLog {
//!     fn recipe_detected(&self, event: &RecipeStatusEvent) {
//!         println!("{} detected: {}", event.recipe_name, event.message);
//!     }
//!
//!     fn recipe_unsupported(&self, event: &RecipeStatusEvent) {
//!         println!("{} unsupported: {}", event.recipe_name, event.message);
//!     }
//! }
//!
//! let subscribers: Vec<Arc<dyn StatusSubscriber>> = vec![Arc::new(InstallLog)];
//! let reporter = StatusReporter::new(subscribers);
//! assert_eq!(reporter.subscriber_count(), 1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use preflight_core::Recipe;
use serde::{Deserialize, Serialize};

/// Payload delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStatusEvent {
    /// Recipe name
    pub recipe_name: String,

    /// Recipe display name
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub display_name: String,

    /// Why the recipe was excluded
    pub message: String,

    /// When the status was recorded (UTC)
    pub timestamp: DateTime<Utc>,
}

impl RecipeStatusEvent {
    pub fn new(recipe: &Recipe, message: impl Into<String>) -> Self {
        Self {
            recipe_name: recipe.name.clone(),
            display_name: recipe.display_name.clone(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Observer trait for recipe status notifications
///
/// Subscribers may be notified from several tasks at once.
pub trait StatusSubscriber: Send + Sync {
    /// The host runs the recipe's target software but it failed validation
    fn recipe_detected(&self, event: &RecipeStatusEvent);

    /// The host does not meet the recipe's prerequisites
    fn recipe_unsupported(&self, event: &RecipeStatusEvent);
}

/// A no-op subscriber that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSubscriber;

impl StatusSubscriber for NoOpSubscriber {
    fn recipe_detected(&self, _event: &RecipeStatusEvent) {}

    fn recipe_unsupported(&self, _event: &RecipeStatusEvent) {}
}

/// A subscriber that logs status events using the `tracing` crate
///
/// Both notifications are logged at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSubscriber;

impl StatusSubscriber for LoggingSubscriber {
    fn recipe_detected(&self, event: &RecipeStatusEvent) {
        tracing::info!(
            recipe = %event.recipe_name,
            message = %event.message,
            "recipe detected but unsupported"
        );
    }

    fn recipe_unsupported(&self, event: &RecipeStatusEvent) {
        tracing::info!(
            recipe = %event.recipe_name,
            message = %event.message,
            "recipe unsupported"
        );
    }
}

/// A subscriber that counts notifications
///
/// Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsSubscriber {
    /// "Recipe detected" notifications
    pub detected: AtomicU32,
    /// "Recipe unsupported" notifications
    pub unsupported: AtomicU32,
}

impl StatsSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of "recipe detected" notifications
    pub fn detected_count(&self) -> u32 {
        self.detected.load(Ordering::SeqCst)
    }

    /// Get the number of "recipe unsupported" notifications
    pub fn unsupported_count(&self) -> u32 {
        self.unsupported.load(Ordering::SeqCst)
    }
}

impl StatusSubscriber for StatsSubscriber {
    fn recipe_detected(&self, _event: &RecipeStatusEvent) {
        self.detected.fetch_add(1, Ordering::SeqCst);
    }

    fn recipe_unsupported(&self, _event: &RecipeStatusEvent) {
        self.unsupported.fetch_add(1, Ordering::SeqCst);
    }
}

/// Implement StatusSubscriber for Arc<T> where T: StatusSubscriber
impl<T: StatusSubscriber + ?Sized> StatusSubscriber for Arc<T> {
    fn recipe_detected(&self, event: &RecipeStatusEvent) {
        (**self).recipe_detected(event)
    }

    fn recipe_unsupported(&self, event: &RecipeStatusEvent) {
        (**self).recipe_unsupported(event)
    }
}

/// Implement StatusSubscriber for Box<T> where T: StatusSubscriber
impl<T: StatusSubscriber + ?Sized> StatusSubscriber for Box<T> {
    fn recipe_detected(&self, event: &RecipeStatusEvent) {
        (**self).recipe_detected(event)
    }

    fn recipe_unsupported(&self, event: &RecipeStatusEvent) {
        (**self).recipe_unsupported(event)
    }
}

/// Kind of status recorded for a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeStatusKind {
    Detected,
    Unsupported,
}

/// A status recorded by the reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeStatus {
    pub kind: RecipeStatusKind,
    #[serde(flatten)]
    pub event: RecipeStatusEvent,
}

/// Fans status notifications out to injected subscribers
///
/// Also keeps a log of every status it has delivered, in delivery order.
#[derive(Default)]
pub struct StatusReporter {
    subscribers: Vec<Arc<dyn StatusSubscriber>>,
    statuses: Mutex<Vec<RecipeStatus>>,
}

impl std::fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusReporter")
            .field("subscribers", &self.subscribers.len())
            .field("statuses", &*self.lock_statuses())
            .finish()
    }
}

impl StatusReporter {
    /// Create a reporter with the given subscribers
    pub fn new(subscribers: Vec<Arc<dyn StatusSubscriber>>) -> Self {
        Self {
            subscribers,
            statuses: Mutex::new(Vec::new()),
        }
    }

    /// Add a subscriber
    pub fn with_subscriber(mut self, subscriber: Arc<dyn StatusSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Notify every subscriber that `recipe` was detected but is unsupported
    pub fn recipe_detected(&self, recipe: &Recipe, message: &str) {
        let event = RecipeStatusEvent::new(recipe, message);
        for subscriber in &self.subscribers {
            subscriber.recipe_detected(&event);
        }
        self.record(RecipeStatusKind::Detected, event);
    }

    /// Notify every subscriber that `recipe` is unsupported
    pub fn recipe_unsupported(&self, recipe: &Recipe, message: &str) {
        let event = RecipeStatusEvent::new(recipe, message);
        for subscriber in &self.subscribers {
            subscriber.recipe_unsupported(&event);
        }
        self.record(RecipeStatusKind::Unsupported, event);
    }

    /// Every status delivered so far
    pub fn statuses(&self) -> Vec<RecipeStatus> {
        self.lock_statuses().clone()
    }

    /// Latest status delivered for a recipe
    pub fn status_of(&self, recipe_name: &str) -> Option<RecipeStatusKind> {
        self.lock_statuses()
            .iter()
            .rev()
            .find(|s| s.event.recipe_name == recipe_name)
            .map(|s| s.kind)
    }

    /// Number of statuses delivered per kind
    pub fn counts(&self) -> HashMap<RecipeStatusKind, usize> {
        let mut counts = HashMap::new();
        for status in self.lock_statuses().iter() {
            *counts.entry(status.kind).or_insert(0) += 1;
        }
        counts
    }

    fn record(&self, kind: RecipeStatusKind, event: RecipeStatusEvent) {
        self.lock_statuses().push(RecipeStatus { kind, event });
    }

    fn lock_statuses(&self) -> MutexGuard<'_, Vec<RecipeStatus>> {
        // A panicking subscriber must not disable reporting
        self.statuses.lock().unwrap_or_else(|e| e.into_inner())
    }
}
