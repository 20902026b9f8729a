//! Recipe filter runner
//!
//! Decides, for each recipe, whether it should be attempted on a host:
//!
//! 1. Host rules run once per filter run; any message rejects the host.
//! 2. Recipes with process patterns that match nothing are unsupported
//!    without running their validation command.
//! 3. The validation command's exit status classifies the rest.
//!
//! Detected and unsupported verdicts are reported to the injected
//! [`StatusReporter`]. Validation errors are not verdicts and are only
//! surfaced in the returned report.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use preflight_core::{FilterSettings, HostSnapshot, Recipe};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{FilterError, Result};
use crate::outcome::{Outcome, RecipeState};
use crate::process;
use crate::report::{ExcludedRecipe, FilterSummary};
use crate::reporter::StatusReporter;
use crate::validation::{ExecutionResult, HostContext, ValidationFailure, ValidationRunner};
use crate::version::{HostRule, WindowsVersionRule};

/// Outcome of one recipe together with the state it ended in
#[derive(Debug, Clone, PartialEq, Eq)]
struct RecipeEvaluation {
    state: RecipeState,
    outcome: Outcome,
}

impl RecipeEvaluation {
    fn new(outcome: Outcome) -> Self {
        Self {
            state: RecipeState::from(&outcome),
            outcome,
        }
    }
}

/// Runs the compatibility filter over recipes
pub struct RecipeFilterRunner {
    validator: ValidationRunner,
    reporter: Arc<StatusReporter>,
    host_rules: Vec<Box<dyn HostRule>>,
    max_concurrency: usize,
}

impl RecipeFilterRunner {
    /// Create a runner with default settings and the Windows version rule
    pub fn new(reporter: Arc<StatusReporter>) -> Self {
        Self {
            validator: ValidationRunner::new(),
            reporter,
            host_rules: vec![Box::new(WindowsVersionRule::new())],
            max_concurrency: 1,
        }
    }

    /// Create a runner from configuration
    pub fn from_settings(settings: &FilterSettings, reporter: Arc<StatusReporter>) -> Self {
        Self::new(reporter)
            .with_validator(ValidationRunner::from_settings(settings))
            .with_max_concurrency(settings.max_concurrency)
    }

    pub fn with_validator(mut self, validator: ValidationRunner) -> Self {
        self.validator = validator;
        self
    }

    /// Evaluate up to `max` recipes at once; 1 keeps input order
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_host_rule(mut self, rule: Box<dyn HostRule>) -> Self {
        self.host_rules.push(rule);
        self
    }

    /// Drop all host rules, including the built-in ones
    pub fn without_host_rules(mut self) -> Self {
        self.host_rules.clear();
        self
    }

    pub fn reporter(&self) -> &StatusReporter {
        &self.reporter
    }

    /// Apply every host rule to the snapshot
    pub fn check_host(&self, host: &HostSnapshot) -> Result<()> {
        let messages: Vec<String> = self
            .host_rules
            .iter()
            .filter_map(|rule| {
                let message = rule.check(host)?;
                warn!("Host rule {} rejected host: {}", rule.name(), message);
                Some(message)
            })
            .collect();

        if messages.is_empty() {
            Ok(())
        } else {
            Err(FilterError::HostIncompatible { messages })
        }
    }

    /// Classify a single recipe
    pub async fn evaluate(
        &self,
        token: &CancellationToken,
        recipe: &Recipe,
        host: &HostSnapshot,
    ) -> Outcome {
        self.evaluate_recipe(token, recipe, host).await.outcome
    }

    /// Check every recipe; succeeds only if all of them are compatible
    pub async fn evaluate_all(
        &self,
        token: &CancellationToken,
        recipes: &[Recipe],
        host: &HostSnapshot,
    ) -> Result<()> {
        let summary = self.filter_compatible(token, recipes, host).await?;
        if summary.report.is_empty() {
            Ok(())
        } else {
            Err(FilterError::RecipesExcluded(summary.report))
        }
    }

    /// Split recipes into compatible ones and an exclusion report
    ///
    /// Fails only when the host is rejected or `token` is cancelled.
    pub async fn filter_compatible(
        &self,
        token: &CancellationToken,
        recipes: &[Recipe],
        host: &HostSnapshot,
    ) -> Result<FilterSummary> {
        if token.is_cancelled() {
            return Err(FilterError::Cancelled);
        }
        self.check_host(host)?;

        info!("Filtering {} recipe(s)", recipes.len());

        let mut evaluations = if self.max_concurrency <= 1 {
            let mut evaluations = Vec::with_capacity(recipes.len());
            for (index, recipe) in recipes.iter().enumerate() {
                if token.is_cancelled() {
                    break;
                }
                evaluations.push((index, self.evaluate_recipe(token, recipe, host).await));
            }
            evaluations
        } else {
            debug!("Evaluating with concurrency {}", self.max_concurrency);
            stream::iter(recipes.iter().enumerate())
                .map(|(index, recipe)| async move {
                    (index, self.evaluate_recipe(token, recipe, host).await)
                })
                .buffer_unordered(self.max_concurrency)
                .collect::<Vec<_>>()
                .await
        };

        if token.is_cancelled() {
            warn!("Recipe filtering cancelled");
            return Err(FilterError::Cancelled);
        }

        // Completion order varies when concurrent; report in input order
        evaluations.sort_by_key(|(index, _)| *index);

        let mut summary = FilterSummary::default();
        for (index, evaluation) in evaluations {
            let recipe = &recipes[index];
            if evaluation.outcome.is_compatible() {
                summary.compatible.push(recipe.clone());
            } else {
                summary.report.push(ExcludedRecipe::new(
                    recipe,
                    evaluation.state,
                    evaluation.outcome,
                ));
            }
        }

        info!(
            "{} recipe(s) compatible, {} excluded",
            summary.compatible.len(),
            summary.report.len()
        );
        Ok(summary)
    }

    async fn evaluate_recipe(
        &self,
        token: &CancellationToken,
        recipe: &Recipe,
        host: &HostSnapshot,
    ) -> RecipeEvaluation {
        if token.is_cancelled() {
            return RecipeEvaluation::new(Outcome::ValidationError {
                detail: ValidationFailure::Cancelled,
            });
        }

        let matched =
            process::matching_processes(&recipe.process_match, &host.discovered_processes);
        if recipe.has_process_match() && matched.is_empty() {
            let message = format!(
                "no running process matched {}",
                recipe
                    .process_match
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            debug!("Recipe {} filtered out: {}", recipe.name, message);
            self.reporter.recipe_unsupported(recipe, &message);
            return RecipeEvaluation {
                state: RecipeState::ProcessMatchFailed,
                outcome: Outcome::Unsupported { message },
            };
        }

        let result = match recipe.validation_command() {
            Some(command) => {
                let context = HostContext::new(recipe, host, &matched);
                self.validator.run(token, command, &context).await
            }
            None => ExecutionResult::Passed,
        };

        let evaluation = RecipeEvaluation::new(Outcome::from_execution(recipe, result));
        match &evaluation.outcome {
            Outcome::Compatible => {
                debug!("Recipe {} is compatible", recipe.name);
            }
            Outcome::DetectedUnsupported { message } => {
                info!("Recipe {} detected but unsupported: {}", recipe.name, message);
                self.reporter.recipe_detected(recipe, message);
            }
            Outcome::Unsupported { message } => {
                info!("Recipe {} unsupported: {}", recipe.name, message);
                self.reporter.recipe_unsupported(recipe, message);
            }
            Outcome::ValidationError { detail } => {
                warn!("Validation of recipe {} failed: {}", recipe.name, detail);
            }
        }

        evaluation
    }
}
