//! Dispatcher trait definitions for dependency injection

use async_trait::async_trait;

use shared::ApiFailure;
use crate::error::DispatchResult;
use crate::types::{BackendResponse, DispatchRequest, DispatchResponse, ProviderSnapshot};

/// One long-lived client handle for a rate-limited text backend
#[mockall::automock]
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Send one request and return the generated text
    async fn generate(&self, request: &DispatchRequest) -> Result<BackendResponse, ApiFailure>;
}

/// Quota-aware request dispatch across the provider pool
#[mockall::automock]
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Route a request to an eligible provider, waiting for capacity if needed.
    ///
    /// Failures are returned to the caller after the provider's quota state has
    /// been updated; the request is never retried on another provider.
    async fn dispatch(&self, request: DispatchRequest) -> DispatchResult<DispatchResponse>;

    /// Send an image-bearing request straight to the vision provider, outside quota accounting
    async fn dispatch_vision(&self, request: DispatchRequest) -> DispatchResult<DispatchResponse>;

    /// Current counters of every pool provider
    async fn provider_status(&self) -> Vec<ProviderSnapshot>;
}
