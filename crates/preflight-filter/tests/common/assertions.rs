//! Assertion helpers for filter outcomes

#![allow(dead_code)]

use preflight_filter::{FilterError, FilterReport, Outcome, RecipeState, StatsSubscriber};

/// Assert the stats subscriber saw exactly these callback counts
pub fn assert_callbacks(stats: &StatsSubscriber, detected: u32, unsupported: u32) {
    assert_eq!(
        stats.detected_count(),
        detected,
        "unexpected detected callback count"
    );
    assert_eq!(
        stats.unsupported_count(),
        unsupported,
        "unexpected unsupported callback count"
    );
}

/// Unwrap the exclusion report from a filter error
pub fn expect_excluded(result: Result<(), FilterError>) -> FilterReport {
    match result {
        Err(FilterError::RecipesExcluded(report)) => report,
        other => panic!("Expected RecipesExcluded, got {:?}", other),
    }
}

/// Assert the report excluded `name` in the given state
pub fn assert_excluded_as(report: &FilterReport, name: &str, state: RecipeState) {
    let excluded = report
        .get(name)
        .unwrap_or_else(|| panic!("{} was not excluded", name));
    assert_eq!(excluded.state, state, "unexpected state for {}", name);
}

pub fn assert_validation_error(outcome: &Outcome) {
    assert!(
        matches!(outcome, Outcome::ValidationError { .. }),
        "Expected ValidationError, got {:?}",
        outcome
    );
}
