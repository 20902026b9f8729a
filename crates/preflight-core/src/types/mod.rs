//! Type definitions for Preflight

mod host;
mod recipe;

pub use host::*;
pub use recipe::*;
