//! Dispatcher data types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable index of a provider within the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(usize);

impl ProviderId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API {}", self.0)
    }
}

/// Backend family a provider talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Groq,
    Gemini,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Groq => "groq",
            BackendKind::Gemini => "gemini",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::Groq => "llama-3.3-70b-versatile",
            BackendKind::Gemini => "gemini-2.5-flash",
        }
    }

    /// Published free-tier limits for the family
    pub fn default_limits(&self) -> QuotaLimits {
        match self {
            BackendKind::Groq => QuotaLimits::new(30, 1_000, Some(100_000)),
            BackendKind::Gemini => QuotaLimits::new(15, 1_500, Some(1_000_000)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable quota configuration of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    /// Requests per minute
    pub rpm: u32,
    /// Requests per day
    pub rpd: u32,
    /// Tokens per day, unbounded when absent
    pub tpd: Option<u64>,
}

impl QuotaLimits {
    pub fn new(rpm: u32, rpd: u32, tpd: Option<u64>) -> Self {
        Self { rpm, rpd, tpd }
    }

    /// Delay between consecutive requests that spreads the minute budget evenly
    pub fn pacing_interval(&self) -> Duration {
        let rpm = u64::from(self.rpm.max(1));
        Duration::from_millis(60_000u64.div_ceil(rpm))
    }
}

/// Static description of one registered provider (credentials stay in the backend)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub kind: BackendKind,
    pub model: String,
    pub limits: QuotaLimits,
}

impl ProviderDescriptor {
    pub fn new(kind: BackendKind, model: impl Into<String>, limits: QuotaLimits) -> Self {
        Self {
            kind,
            model: model.into(),
            limits,
        }
    }

    pub fn with_defaults(kind: BackendKind) -> Self {
        Self::new(kind, kind.default_model(), kind.default_limits())
    }
}

/// One piece of request content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Image reference, either an `http(s)` URL or a `data:` URL
    ImageUrl { url: String },
}

/// Opaque payload sent to a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub request_id: Uuid,
    pub parts: Vec<ContentPart>,
}

impl DispatchRequest {
    /// Text-only request
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            parts: vec![ContentPart::Text { text: prompt.into() }],
        }
    }

    /// Text plus one image, for the vision path
    pub fn with_image(prompt: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            parts: vec![
                ContentPart::Text { text: prompt.into() },
                ContentPart::ImageUrl { url: image_url.into() },
            ],
        }
    }

    /// All text parts joined by newlines
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ImageUrl { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_image(&self) -> bool {
        self.parts.iter().any(|part| matches!(part, ContentPart::ImageUrl { .. }))
    }

    /// Character count used for token estimation
    pub fn char_len(&self) -> usize {
        self.parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => text.chars().count(),
                ContentPart::ImageUrl { url } => url.chars().count(),
            })
            .sum()
    }
}

/// Raw backend reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub content: String,
    /// Token count reported by the provider, when it reports one
    pub usage_hint: Option<u64>,
}

impl BackendResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage_hint: None,
        }
    }
}

/// Result of a dispatch, with the provider that served it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    /// `None` when served by the vision provider outside the pool
    pub provider: Option<ProviderId>,
    pub content: String,
    pub estimated_tokens: u64,
    pub usage_hint: Option<u64>,
}

/// Point-in-time view of a provider's counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    pub id: ProviderId,
    pub kind: BackendKind,
    pub model: String,
    pub requests_this_minute: u32,
    pub rpm: u32,
    pub requests_today: u32,
    pub rpd: u32,
    pub tokens_today: u64,
    pub tpd: Option<u64>,
    pub exhausted: bool,
}

impl fmt::Display for ProviderSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tpd = self
            .tpd
            .map(|limit| limit.to_string())
            .unwrap_or_else(|| "unlimited".to_string());
        write!(
            f,
            "{} ({}): {}/{} RPM, {}/{} RPD, Tokens: {}/{}{}",
            self.id,
            self.kind,
            self.requests_this_minute,
            self.rpm,
            self.requests_today,
            self.rpd,
            self.tokens_today,
            tpd,
            if self.exhausted { " [exhausted]" } else { "" }
        )
    }
}
