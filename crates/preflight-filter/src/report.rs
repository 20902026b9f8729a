//! Aggregated filter results

use std::fmt;

use preflight_core::Recipe;

use crate::outcome::{Outcome, RecipeState};

/// A recipe the filter excluded, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedRecipe {
    pub name: String,
    pub display_name: String,
    /// The recipe's `preInstall.info` text, if any
    pub info: Option<String>,
    pub state: RecipeState,
    pub outcome: Outcome,
}

impl ExcludedRecipe {
    pub fn new(recipe: &Recipe, state: RecipeState, outcome: Outcome) -> Self {
        Self {
            name: recipe.name.clone(),
            display_name: recipe.display_name.clone(),
            info: recipe.pre_install.info.clone(),
            state,
            outcome,
        }
    }
}

impl fmt::Display for ExcludedRecipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.display_name.is_empty() {
            write!(f, "{}: {}", self.name, self.outcome)
        } else {
            write!(f, "{} ({}): {}", self.name, self.display_name, self.outcome)
        }
    }
}

/// Every recipe excluded during one filter run, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    excluded: Vec<ExcludedRecipe>,
}

impl FilterReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, excluded: ExcludedRecipe) {
        self.excluded.push(excluded);
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }

    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    pub fn excluded(&self) -> &[ExcludedRecipe] {
        &self.excluded
    }

    /// Names of the excluded recipes
    pub fn names(&self) -> Vec<&str> {
        self.excluded.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ExcludedRecipe> {
        self.excluded.iter().find(|e| e.name == name)
    }

    /// Count of exclusions caused by broken checks rather than verdicts
    pub fn validation_errors(&self) -> usize {
        self.excluded
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::ValidationError { .. }))
            .count()
    }
}

impl fmt::Display for FilterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} recipe(s) excluded:", self.excluded.len())?;
        for excluded in &self.excluded {
            write!(f, "\n  - {}", excluded)?;
        }
        Ok(())
    }
}

/// Compatible recipes plus the exclusion report
#[derive(Debug, Clone, Default)]
pub struct FilterSummary {
    pub compatible: Vec<Recipe>,
    pub report: FilterReport,
}

impl FilterSummary {
    pub fn compatible(&self) -> &[Recipe] {
        &self.compatible
    }

    pub fn all_compatible(&self) -> bool {
        self.report.is_empty()
    }
}
