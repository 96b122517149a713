//! Quota-aware round-robin rotator over the provider pool

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use shared::{ApiFailure, FailureKind};
use crate::core::quota::{estimate_tokens, ProviderUsage};
use crate::error::{DispatchError, DispatchResult};
use crate::services::registry::{ProviderEntry, ProviderRegistry};
use crate::traits::{Dispatcher, ProviderBackend};
use crate::types::{DispatchRequest, DispatchResponse, ProviderId, ProviderSnapshot};

/// Rotator tuning knobs
#[derive(Debug, Clone)]
pub struct RotatorConfig {
    /// Wait between sweeps when no provider has capacity
    pub backoff: Duration,
    /// Full passes over the pool per sweep
    pub sweep_cycles: usize,
    /// Sleep `ceil(60000 / rpm)` ms after each successful dispatch
    pub pacing: bool,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(5),
            sweep_cycles: 2,
            pacing: true,
        }
    }
}

struct PoolState {
    cursor: usize,
    usage: Vec<ProviderUsage>,
}

/// Process-wide dispatcher; share it between runs behind an `Arc`
pub struct Rotator {
    providers: Vec<ProviderEntry>,
    vision: Option<Arc<dyn ProviderBackend>>,
    state: Mutex<PoolState>,
    config: RotatorConfig,
}

impl Rotator {
    pub fn new(registry: ProviderRegistry, config: RotatorConfig) -> Self {
        let now = Instant::now();
        let providers = registry.providers().to_vec();
        let usage = providers.iter().map(|_| ProviderUsage::new(now)).collect();

        Self {
            vision: registry.vision().cloned(),
            providers,
            state: Mutex::new(PoolState { cursor: 0, usage }),
            config,
        }
    }

    pub fn with_defaults(registry: ProviderRegistry) -> Self {
        Self::new(registry, RotatorConfig::default())
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Reserve one request slot on the next eligible provider.
    ///
    /// Waits in `backoff` steps for as long as it takes; quota windows always
    /// reopen. Only an empty pool is an error.
    pub async fn acquire(&self) -> DispatchResult<ProviderId> {
        if self.providers.is_empty() {
            return Err(DispatchError::NoProviders);
        }

        loop {
            if let Some(provider) = self.try_reserve().await {
                debug!("🔀 Selected {}", provider);
                return Ok(provider);
            }

            warn!(
                "⏳ All {} providers at capacity, retrying in {:?}",
                self.providers.len(),
                self.config.backoff
            );
            tokio::time::sleep(self.config.backoff).await;
        }
    }

    async fn try_reserve(&self) -> Option<ProviderId> {
        let mut state = self.state.lock().await;
        let count = self.providers.len();
        let probes = count * self.config.sweep_cycles.max(1);

        for offset in 0..probes {
            let index = (state.cursor + offset) % count;
            let limits = &self.providers[index].descriptor.limits;
            let usage = &mut state.usage[index];

            usage.roll_windows(Instant::now());
            if usage.has_capacity(limits) {
                usage.record_request();
                state.cursor = (index + 1) % count;
                return Some(ProviderId::new(index));
            }
        }

        None
    }

    async fn record_success(&self, provider: ProviderId, tokens: u64) {
        let mut state = self.state.lock().await;
        state.usage[provider.index()].record_tokens(tokens);
    }

    async fn record_failure(&self, provider: ProviderId, failure: &ApiFailure) {
        let limits = &self.providers[provider.index()].descriptor.limits;
        let mut state = self.state.lock().await;
        let usage = &mut state.usage[provider.index()];

        match failure.kind() {
            FailureKind::QuotaExhausted => {
                usage.mark_exhausted(limits);
                warn!("🚫 {} exhausted its daily quota", provider);
            }
            FailureKind::RateLimited => {
                usage.mark_rate_limited(limits);
                warn!("🐢 {} rate limited until the minute window rolls over", provider);
            }
            FailureKind::Other => {
                debug!("{} request failed: {}", provider, failure);
            }
        }
    }
}

#[async_trait]
impl Dispatcher for Rotator {
    async fn dispatch(&self, request: DispatchRequest) -> DispatchResult<DispatchResponse> {
        let provider = self.acquire().await?;
        let entry = &self.providers[provider.index()];

        match entry.backend.generate(&request).await {
            Ok(response) => {
                let estimated_tokens = estimate_tokens(request.char_len() + response.content.chars().count());
                self.record_success(provider, estimated_tokens).await;

                if self.config.pacing {
                    tokio::time::sleep(entry.descriptor.limits.pacing_interval()).await;
                }

                Ok(DispatchResponse {
                    provider: Some(provider),
                    content: response.content,
                    estimated_tokens,
                    usage_hint: response.usage_hint,
                })
            }
            Err(failure) => {
                self.record_failure(provider, &failure).await;
                Err(DispatchError::ProviderFailed {
                    provider,
                    reason: failure,
                })
            }
        }
    }

    async fn dispatch_vision(&self, request: DispatchRequest) -> DispatchResult<DispatchResponse> {
        let backend = self.vision.as_ref().ok_or(DispatchError::VisionUnavailable)?;
        debug!("🖼️ Sending request {} to the vision provider", request.request_id);

        let response = backend
            .generate(&request)
            .await
            .map_err(|reason| DispatchError::VisionFailed { reason })?;

        Ok(DispatchResponse {
            provider: None,
            estimated_tokens: estimate_tokens(request.char_len() + response.content.chars().count()),
            content: response.content,
            usage_hint: response.usage_hint,
        })
    }

    async fn provider_status(&self) -> Vec<ProviderSnapshot> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        self.providers
            .iter()
            .zip(state.usage.iter_mut())
            .enumerate()
            .map(|(index, (entry, usage))| {
                usage.roll_windows(now);
                ProviderSnapshot {
                    id: ProviderId::new(index),
                    kind: entry.descriptor.kind,
                    model: entry.descriptor.model.clone(),
                    requests_this_minute: usage.requests_this_minute,
                    rpm: entry.descriptor.limits.rpm,
                    requests_today: usage.requests_today,
                    rpd: entry.descriptor.limits.rpd,
                    tokens_today: usage.tokens_today,
                    tpd: entry.descriptor.limits.tpd,
                    exhausted: usage.exhausted,
                }
            })
            .collect()
    }
}
