//! Provider registry built from static configuration
//!
//! ## Configuration Sources
//! Keys are loaded from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! ## Pool providers
//! - `GROQ_API_KEY`, `GROQ_API_KEY_1` .. `GROQ_API_KEY_16`: one Groq provider each
//! - `GEMINI_API_KEY`: one Gemini provider, appended last
//!
//! `GEMINI_API_KEY` also enables the vision provider. `GROQ_MODEL` and
//! `GEMINI_MODEL` override the default models.

use std::sync::Arc;

use crate::error::{DispatchError, DispatchResult};
use crate::services::backends::{GenerationParams, RealGeminiBackend, RealGroqBackend};
use crate::traits::ProviderBackend;
use crate::types::{BackendKind, ProviderDescriptor};

/// Highest numbered `GROQ_API_KEY_n` variable that is read
pub const MAX_NUMBERED_GROQ_KEYS: usize = 16;

/// One registered provider: its limits and a long-lived client handle
#[derive(Clone)]
pub struct ProviderEntry {
    pub descriptor: ProviderDescriptor,
    pub backend: Arc<dyn ProviderBackend>,
}

/// Ordered provider pool plus the optional vision provider
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderEntry>,
    vision: Option<Arc<dyn ProviderBackend>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider to the round-robin pool; its index is its position
    pub fn with_provider(mut self, descriptor: ProviderDescriptor, backend: Arc<dyn ProviderBackend>) -> Self {
        self.providers.push(ProviderEntry { descriptor, backend });
        self
    }

    /// Set the image-capable provider used outside quota accounting
    pub fn with_vision(mut self, backend: Arc<dyn ProviderBackend>) -> Self {
        self.vision = Some(backend);
        self
    }

    pub fn providers(&self) -> &[ProviderEntry] {
        &self.providers
    }

    pub fn vision(&self) -> Option<&Arc<dyn ProviderBackend>> {
        self.vision.as_ref()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Build the registry from a variable lookup.
    ///
    /// Fails with a configuration error when no pool provider is configured.
    pub fn from_lookup<F>(lookup: F) -> DispatchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let groq_model = present("GROQ_MODEL").unwrap_or_else(|| BackendKind::Groq.default_model().to_string());
        let gemini_model = present("GEMINI_MODEL").unwrap_or_else(|| BackendKind::Gemini.default_model().to_string());

        let mut groq_vars = vec!["GROQ_API_KEY".to_string()];
        groq_vars.extend((1..=MAX_NUMBERED_GROQ_KEYS).map(|n| format!("GROQ_API_KEY_{n}")));

        let mut registry = Self::new();

        for var in &groq_vars {
            if let Some(key) = present(var) {
                let descriptor = ProviderDescriptor::new(
                    BackendKind::Groq,
                    groq_model.clone(),
                    BackendKind::Groq.default_limits(),
                );
                let backend = Arc::new(RealGroqBackend::new(key, groq_model.clone()));
                registry = registry.with_provider(descriptor, backend);
            }
        }

        if let Some(key) = present("GEMINI_API_KEY") {
            let descriptor = ProviderDescriptor::new(
                BackendKind::Gemini,
                gemini_model.clone(),
                BackendKind::Gemini.default_limits(),
            );
            registry = registry
                .with_provider(descriptor, Arc::new(RealGeminiBackend::new(key.clone(), gemini_model.clone())))
                .with_vision(Arc::new(
                    RealGeminiBackend::new(key, gemini_model).with_params(GenerationParams::vision()),
                ));
        }

        if registry.is_empty() {
            return Err(DispatchError::ConfigError {
                message: "No provider keys found. Set GROQ_API_KEY, GROQ_API_KEY_1..16 or GEMINI_API_KEY".to_string(),
            });
        }

        tracing::info!(
            "🔑 Registered {} provider(s), vision {}",
            registry.len(),
            if registry.vision.is_some() { "enabled" } else { "disabled" }
        );

        Ok(registry)
    }

    /// Build the registry from `.env` and the process environment
    pub fn from_env() -> DispatchResult<Self> {
        // Missing .env is fine; environment variables still apply
        let _ = dotenv::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}
