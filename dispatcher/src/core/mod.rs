//! Pure dispatcher logic without I/O

pub mod quota;

pub use quota::{estimate_tokens, ProviderUsage, CHARS_PER_TOKEN, DAY_WINDOW, MINUTE_WINDOW, TOKEN_HEADROOM};
