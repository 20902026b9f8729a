//! Common test utilities for preflight-filter
//!
//! This module provides shared test infrastructure including:
//! - Recipe and host builders
//! - Runner fixtures wired to a stats subscriber
//! - Assertion helpers for filter outcomes

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod assertions;
pub mod builders;
pub mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
