//! Per-recipe classification

use std::fmt;

use preflight_core::Recipe;

use crate::validation::{ExecutionResult, ValidationFailure};

/// Result of evaluating one recipe against a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The recipe may be installed
    Compatible,
    /// The host runs the target software but it fails a stricter check
    DetectedUnsupported { message: String },
    /// The host does not meet the recipe's prerequisites
    Unsupported { message: String },
    /// The compatibility check itself failed
    ValidationError { detail: ValidationFailure },
}

impl Outcome {
    /// Map a validation command result onto an outcome for `recipe`
    pub fn from_execution(recipe: &Recipe, result: ExecutionResult) -> Self {
        match result {
            ExecutionResult::Passed => Self::Compatible,
            ExecutionResult::Detected { output, .. } => Self::DetectedUnsupported {
                message: if output.is_empty() {
                    format!(
                        "{} was detected on this host but does not meet the requirements for installation",
                        subject(recipe)
                    )
                } else {
                    output
                },
            },
            ExecutionResult::Rejected { exit_code, output } => Self::Unsupported {
                message: if output.is_empty() {
                    format!(
                        "{} is not supported on this host (validation exited with code {})",
                        subject(recipe),
                        exit_code
                    )
                } else {
                    output
                },
            },
            ExecutionResult::Failed(detail) => Self::ValidationError { detail },
        }
    }

    pub fn is_compatible(&self) -> bool {
        matches!(self, Self::Compatible)
    }

    /// Whether the outcome comes from cancellation rather than a verdict
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::ValidationError { detail } if detail.is_cancellation())
    }

    /// Short classification label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Compatible => "compatible",
            Self::DetectedUnsupported { .. } => "detected but unsupported",
            Self::Unsupported { .. } => "unsupported",
            Self::ValidationError { .. } => "validation error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compatible => write!(f, "compatible"),
            Self::DetectedUnsupported { message } | Self::Unsupported { message } => {
                write!(f, "{}: {}", self.kind(), message)
            }
            Self::ValidationError { detail } => write!(f, "{}: {}", self.kind(), detail),
        }
    }
}

/// Name used when a message has to mention the recipe
pub(crate) fn subject(recipe: &Recipe) -> &str {
    match recipe.first_name() {
        "" => recipe.name.as_str(),
        first => first,
    }
}

/// Terminal state reached by a recipe during one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeState {
    Pending,
    ProcessMatchFailed,
    Compatible,
    DetectedUnsupported,
    Unsupported,
    ValidationError,
}

impl RecipeState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl From<&Outcome> for RecipeState {
    fn from(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Compatible => Self::Compatible,
            Outcome::DetectedUnsupported { .. } => Self::DetectedUnsupported,
            Outcome::Unsupported { .. } => Self::Unsupported,
            Outcome::ValidationError { .. } => Self::ValidationError,
        }
    }
}

impl fmt::Display for RecipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::ProcessMatchFailed => write!(f, "process match failed"),
            Self::Compatible => write!(f, "compatible"),
            Self::DetectedUnsupported => write!(f, "detected unsupported"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::ValidationError => write!(f, "validation error"),
        }
    }
}
