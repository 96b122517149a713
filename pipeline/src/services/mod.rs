//! Service implementations
//!
//! Real implementations of the collaborator traits: the in-process run store,
//! work unit sources and the hosted emotion classifier.

pub mod classifier;
pub mod memory_store;
pub mod work_units;

#[cfg(test)]
pub mod tests;

// Re-export all service implementations
pub use classifier::RealEmotionClassifier;
pub use memory_store::InMemoryRunStore;
pub use work_units::{parse_clusters, FileWorkUnitSource, StaticWorkUnitSource};
