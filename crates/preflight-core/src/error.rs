//! Error types for preflight-core

use thiserror::Error;

/// Result type alias using preflight-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Preflight
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Two recipes in one catalog share a name
    #[error("Duplicate recipe name: {name}")]
    DuplicateRecipe { name: String },

    /// Recipe definition is structurally invalid
    #[error("Invalid recipe {name}: {message}")]
    InvalidRecipe { name: String, message: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a duplicate recipe error
    pub fn duplicate_recipe(name: impl Into<String>) -> Self {
        Self::DuplicateRecipe { name: name.into() }
    }

    /// Create an invalid recipe error
    pub fn invalid_recipe(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecipe {
            name: name.into(),
            message: message.into(),
        }
    }
}
