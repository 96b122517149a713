//! Shared error types for the persona simulation pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid {kind} identifier: {input}")]
    InvalidIdentifier { kind: String, input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
