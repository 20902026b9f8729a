//! Error types for preflight-filter

use thiserror::Error;

use crate::report::FilterReport;

/// Result type alias using preflight-filter's Error type
pub type Result<T> = std::result::Result<T, FilterError>;

/// Why a filter run did not accept every recipe
#[derive(Error, Debug)]
pub enum FilterError {
    /// One or more recipes were excluded
    #[error("{0}")]
    RecipesExcluded(FilterReport),

    /// A host rule rejected the host before any recipe was evaluated
    #[error("Host is not supported: {}", messages.join("; "))]
    HostIncompatible { messages: Vec<String> },

    /// The caller cancelled the run
    #[error("Recipe filtering was cancelled")]
    Cancelled,
}

impl FilterError {
    /// The exclusion report, when recipes were evaluated
    pub fn report(&self) -> Option<&FilterReport> {
        match self {
            Self::RecipesExcluded(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
