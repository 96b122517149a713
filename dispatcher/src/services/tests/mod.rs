//! Tests for dispatcher services
//!
//! Time-dependent behaviour runs on a paused tokio clock.
