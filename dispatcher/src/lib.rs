//! Dispatcher library for quota-aware text generation
//!
//! This library owns the provider pool: per-provider quota windows, the
//! round-robin rotator that admits requests only to providers with capacity,
//! and the HTTP clients for the backends behind it.

pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use error::{DispatchError, DispatchResult};
pub use services::*;
pub use traits::*;
pub use types::*;
