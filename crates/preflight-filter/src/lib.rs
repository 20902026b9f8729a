//! Recipe compatibility filtering for Preflight
//!
//! This crate decides which installation recipes should be attempted on a
//! host:
//! - Host rules (e.g. minimum Windows version)
//! - Process matching against discovered processes
//! - External validation commands with exit-code classification
//! - Status reporting to injected subscribers
//! - Aggregation of every excluded recipe into one error

pub mod error;
pub mod outcome;
pub mod process;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod validation;
pub mod version;

pub use error::FilterError;
pub use outcome::{Outcome, RecipeState};
pub use report::{ExcludedRecipe, FilterReport, FilterSummary};
pub use reporter::{
    LoggingSubscriber, NoOpSubscriber, RecipeStatus, RecipeStatusEvent, RecipeStatusKind,
    StatsSubscriber, StatusReporter, StatusSubscriber,
};
pub use runner::RecipeFilterRunner;
pub use validation::{ExecutionResult, HostContext, ValidationFailure, ValidationRunner};
pub use version::{HostRule, ParsedVersion, WindowsVersionRule};

pub use tokio_util::sync::CancellationToken;
