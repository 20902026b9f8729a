//! Runner fixtures

#![allow(dead_code)]

use std::sync::Arc;

use preflight_filter::{
    RecipeFilterRunner, StatsSubscriber, StatusReporter, StatusSubscriber,
};

/// A runner wired to a stats subscriber, plus that subscriber
pub struct RunnerFixture {
    pub runner: RecipeFilterRunner,
    pub stats: Arc<StatsSubscriber>,
    pub reporter: Arc<StatusReporter>,
}

impl RunnerFixture {
    pub fn new() -> Self {
        let stats = Arc::new(StatsSubscriber::new());
        let subscribers: Vec<Arc<dyn StatusSubscriber>> = vec![stats.clone()];
        let reporter = Arc::new(StatusReporter::new(subscribers));
        let runner = RecipeFilterRunner::new(reporter.clone());
        Self {
            runner,
            stats,
            reporter,
        }
    }

    pub fn with_concurrency(max: usize) -> Self {
        let fixture = Self::new();
        Self {
            runner: fixture.runner.with_max_concurrency(max),
            ..fixture
        }
    }
}

impl Default for RunnerFixture {
    fn default() -> Self {
        Self::new()
    }
}
