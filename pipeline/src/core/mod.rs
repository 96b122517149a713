//! Pure pipeline logic: prompts, labels, aggregation and progress math

pub mod aggregator;
pub mod labels;
pub mod progress;
pub mod prompts;

pub use aggregator::aggregate;
pub use labels::{derive_label, sentiment_for};
pub use progress::{eta_minutes, progress_percent, status_view};
