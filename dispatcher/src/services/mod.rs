//! Dispatcher service implementations

pub mod backends;
pub mod registry;
pub mod rotator;

#[cfg(test)]
pub mod tests;

pub use backends::*;
pub use registry::*;
pub use rotator::*;
