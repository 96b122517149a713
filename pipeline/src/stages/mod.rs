//! Pipeline stages that talk to collaborators

pub mod classification;
pub mod work;

pub use classification::ClassificationStage;
pub use work::WorkGenerator;
