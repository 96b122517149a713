//! Shared types for the persona simulation pipeline
//!
//! Contains only the identifiers, status enums, failure taxonomy and logging
//! helpers used by both the dispatcher and the pipeline crates.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
