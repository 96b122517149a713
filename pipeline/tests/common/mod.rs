//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers used across the pipeline integration tests.

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{ControllerBuilder, FlakyWorkUnitSource, TestHelpers};
