//! # preflight-core
//!
//! Core library for Preflight providing:
//! - Recipe and host snapshot type definitions
//! - Configuration file parsing (preflight.yaml)
//! - Recipe catalog and host snapshot file loading

pub mod config;
pub mod error;
pub mod types;

pub use config::{load_host_snapshot, load_recipes, FilterSettings, PreflightConfig};
pub use error::{Error, Result};
pub use types::{DiscoveredProcess, HostSnapshot, PreInstallConfig, Recipe};
