//! Configuration and file loading for Preflight

mod catalog;
mod loader;

pub use catalog::{load_host_snapshot, load_recipes, parse_host_snapshot, parse_recipes};
pub use loader::{
    FilterSettings, PreflightConfig, DEFAULT_DETECTED_EXIT_CODE, MAX_CONCURRENCY_ENV,
    VALIDATION_TIMEOUT_ENV,
};
