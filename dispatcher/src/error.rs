//! Dispatcher error types

use thiserror::Error;
use shared::ApiFailure;

use crate::types::ProviderId;

/// Result type for dispatcher operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Dispatcher error types
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Provider request failed: {provider} - {reason}")]
    ProviderFailed { provider: ProviderId, reason: ApiFailure },

    #[error("Vision request failed: {reason}")]
    VisionFailed { reason: ApiFailure },

    #[error("No vision provider configured")]
    VisionUnavailable,

    #[error("No providers registered")]
    NoProviders,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl DispatchError {
    /// Backend failure behind this error, if the backend was reached
    pub fn api_failure(&self) -> Option<&ApiFailure> {
        match self {
            DispatchError::ProviderFailed { reason, .. } | DispatchError::VisionFailed { reason } => Some(reason),
            _ => None,
        }
    }
}
