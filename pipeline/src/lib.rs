//! Pipeline library for persona ad-reaction simulation runs
//!
//! This library drives one run per campaign: it loads the persona clusters,
//! generates cluster-level and persona-level reactions through the shared
//! provider pool, classifies their emotions and aggregates run metrics. Runs
//! that hit a fatal error pause and resume themselves.

pub mod controller;
pub mod core;
pub mod error;
pub mod services;
pub mod stages;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use controller::RunController;
pub use error::{PipelineError, PipelineResult};
pub use services::{FileWorkUnitSource, InMemoryRunStore, RealEmotionClassifier, StaticWorkUnitSource};
pub use traits::{Classifier, RunStore, WorkUnitSource};
pub use types::*;
