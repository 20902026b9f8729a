//! Configuration file loading and parsing

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;
use tracing::debug;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["preflight.yaml", "preflight.yml"];

/// Exit code a validation command uses to report "detected but unsupported"
pub const DEFAULT_DETECTED_EXIT_CODE: i32 = 132;

/// Environment variable overriding `filter.maxConcurrency`
pub const MAX_CONCURRENCY_ENV: &str = "PREFLIGHT_MAX_CONCURRENCY";

/// Environment variable overriding `filter.validationTimeoutSecs`
pub const VALIDATION_TIMEOUT_ENV: &str = "PREFLIGHT_VALIDATION_TIMEOUT_SECS";

/// Top-level preflight.yaml contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightConfig {
    /// Recipe filter settings
    #[serde(default)]
    pub filter: FilterSettings,

    /// Path the configuration was loaded from, if any
    #[serde(skip)]
    pub source: Option<Utf8PathBuf>,
}

/// Settings for the recipe filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSettings {
    /// Exit code classified as "detected but unsupported"
    #[serde(default = "default_detected_exit_code")]
    pub detected_exit_code: i32,

    /// Recipes validated at once; 1 evaluates sequentially
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Upper bound for a single validation command; unbounded when unset
    #[serde(default)]
    pub validation_timeout_secs: Option<u64>,

    /// Shell program and flags used to run validation commands
    #[serde(default)]
    pub shell: Option<Vec<String>>,

    /// Extra environment passed to validation commands
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_detected_exit_code() -> i32 {
    DEFAULT_DETECTED_EXIT_CODE
}

fn default_max_concurrency() -> usize {
    1
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            detected_exit_code: DEFAULT_DETECTED_EXIT_CODE,
            max_concurrency: default_max_concurrency(),
            validation_timeout_secs: None,
            shell: None,
            env: BTreeMap::new(),
        }
    }
}

impl FilterSettings {
    /// Validation timeout as a Duration
    pub fn validation_timeout(&self) -> Option<Duration> {
        self.validation_timeout_secs.map(Duration::from_secs)
    }
}

impl PreflightConfig {
    /// Load configuration from the specified path or search for it
    ///
    /// An explicit path must exist. Without one, the current and parent
    /// directories are searched and defaults are used if nothing is found.
    /// Environment overrides are applied in both cases.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let found = match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::config_not_found(p.as_str())
                    } else {
                        Error::Io(e)
                    }
                })?;
                Some((p.to_owned(), content))
            }
            None => Self::find_config()?,
        };

        let mut config = match found {
            Some((config_path, content)) => {
                debug!("Loading configuration from {}", config_path);
                let mut config = Self::from_yaml(&content)?;
                config.source = Some(config_path);
                config
            }
            None => {
                debug!("No preflight.yaml found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(MAX_CONCURRENCY_ENV) {
            self.filter.max_concurrency = value.trim().parse().map_err(|_| {
                Error::invalid_config(format!(
                    "{} must be a positive integer, got '{}'",
                    MAX_CONCURRENCY_ENV, value
                ))
            })?;
        }

        if let Ok(value) = std::env::var(VALIDATION_TIMEOUT_ENV) {
            let secs = value.trim().parse().map_err(|_| {
                Error::invalid_config(format!(
                    "{} must be a number of seconds, got '{}'",
                    VALIDATION_TIMEOUT_ENV, value
                ))
            })?;
            self.filter.validation_timeout_secs = Some(secs);
        }

        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.filter.max_concurrency == 0 {
            return Err(Error::invalid_config("filter.maxConcurrency must be at least 1"));
        }

        if self.filter.detected_exit_code == 0 {
            return Err(Error::invalid_config(
                "filter.detectedExitCode cannot be 0, which means the validation passed",
            ));
        }

        if let Some(shell) = &self.filter.shell {
            if shell.is_empty() || shell[0].trim().is_empty() {
                return Err(Error::invalid_config("filter.shell must name a program"));
            }
        }

        Ok(())
    }

    /// Find configuration file in current directory or parent directories
    fn find_config() -> Result<Option<(Utf8PathBuf, String)>> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok(Some((path, content)));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }
}
