//! Recipe definitions
//!
//! A recipe describes one installable unit along with the prerequisites a
//! host has to meet before installation is attempted.

use serde::{Deserialize, Serialize};

/// An installation recipe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Unique recipe name (e.g., "apache-open-source-integration")
    pub name: String,

    /// Human readable name shown to operators
    #[serde(default)]
    pub display_name: String,

    /// Process name patterns; at least one must match a discovered process
    #[serde(default)]
    pub process_match: Vec<String>,

    /// Checks executed before installation
    #[serde(default)]
    pub pre_install: PreInstallConfig,
}

impl Recipe {
    /// Create a recipe with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the process match patterns
    pub fn with_process_match<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.process_match = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the validation command run at discovery time
    pub fn with_validation(mut self, command: impl Into<String>) -> Self {
        self.pre_install.require_at_discovery = command.into();
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.pre_install.info = Some(info.into());
        self
    }

    /// First word of the display name
    ///
    /// `"MongoDB installation something"` yields `"MongoDB"`. Returns an
    /// empty string when no display name is set.
    pub fn first_name(&self) -> &str {
        self.display_name.split_whitespace().next().unwrap_or("")
    }

    /// Name used in operator-facing messages
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// Whether the recipe declares any process constraint
    pub fn has_process_match(&self) -> bool {
        self.process_match.iter().any(|p| !p.is_empty())
    }

    /// The validation command, if one is declared
    pub fn validation_command(&self) -> Option<&str> {
        let command = self.pre_install.require_at_discovery.trim();
        (!command.is_empty()).then_some(command)
    }
}

/// Pre-install configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreInstallConfig {
    /// Shell command whose exit status decides compatibility; empty means none
    #[serde(default)]
    pub require_at_discovery: String,

    /// Informational text shown before installation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}
