//! HTTP backend clients for the provider pool

use async_trait::async_trait;
use reqwest::Client;

use shared::ApiFailure;
use crate::traits::ProviderBackend;
use crate::types::{BackendResponse, ContentPart, DispatchRequest};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Generation parameters shared by both backends
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
        }
    }
}

impl GenerationParams {
    /// Longer output budget for describing an advertisement image
    pub fn vision() -> Self {
        Self {
            max_tokens: 2048,
            ..Self::default()
        }
    }
}

/// Map a non-success HTTP status and body into a typed failure.
///
/// 429 bodies that mention a daily budget mean the provider is done for the
/// day; any other 429 is a per-minute limit.
pub fn failure_from_status(status: u16, body: &str) -> ApiFailure {
    match status {
        401 | 403 => ApiFailure::AuthenticationFailed,
        429 if mentions_daily_quota(body) => ApiFailure::QuotaExceeded,
        429 => ApiFailure::RateLimitExceeded,
        400 => ApiFailure::InvalidRequest(truncate(body)),
        503 => ApiFailure::ServiceUnavailable,
        _ => ApiFailure::ServerError(format!("HTTP {status}: {}", truncate(body))),
    }
}

fn mentions_daily_quota(body: &str) -> bool {
    let lowered = body.to_lowercase();
    lowered.contains("tokens per day")
        || lowered.contains("(tpd)")
        || lowered.contains("requests per day")
        || lowered.contains("perday")
        || lowered.contains("per day")
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

async fn read_failure(response: reqwest::Response) -> ApiFailure {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    failure_from_status(status, &body)
}

/// Groq client over its OpenAI-compatible chat completions API
pub struct RealGroqBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    params: GenerationParams,
}

impl RealGroqBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GROQ_BASE_URL.to_string(),
            params: GenerationParams::default(),
        }
    }

    /// Point the client at another endpoint (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }
}

#[async_trait]
impl ProviderBackend for RealGroqBackend {
    async fn generate(&self, request: &DispatchRequest) -> Result<BackendResponse, ApiFailure> {
        // Text-only model: image parts are dropped
        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": request.text_content()
                }
            ],
            "max_tokens": self.params.max_tokens,
            "temperature": self.params.temperature
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ApiFailure::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(read_failure(response).await);
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiFailure::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let content = response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| ApiFailure::MalformedResponse("No content in response".to_string()))?;

        let usage_hint = response_json
            .get("usage")
            .and_then(|u| u.get("total_tokens"))
            .and_then(|t| t.as_u64());

        Ok(BackendResponse {
            content: content.to_string(),
            usage_hint,
        })
    }
}

/// Gemini client over the generateContent API; accepts inline images
pub struct RealGeminiBackend {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    params: GenerationParams,
}

impl RealGeminiBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    fn part_json(part: &ContentPart) -> serde_json::Value {
        match part {
            ContentPart::Text { text } => serde_json::json!({ "text": text }),
            ContentPart::ImageUrl { url } => match parse_data_url(url) {
                Some((mime_type, data)) => serde_json::json!({
                    "inline_data": { "mime_type": mime_type, "data": data }
                }),
                None => serde_json::json!({ "text": format!("Image: {url}") }),
            },
        }
    }
}

/// Split `data:<mime>;base64,<payload>` into its mime type and payload
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime_type = meta.strip_suffix(";base64")?;
    Some((mime_type, data))
}

#[async_trait]
impl ProviderBackend for RealGeminiBackend {
    async fn generate(&self, request: &DispatchRequest) -> Result<BackendResponse, ApiFailure> {
        let parts: Vec<serde_json::Value> = request.parts.iter().map(Self::part_json).collect();

        let request_body = serde_json::json!({
            "contents": [
                {
                    "parts": parts
                }
            ],
            "generationConfig": {
                "maxOutputTokens": self.params.max_tokens,
                "temperature": self.params.temperature
            }
        });

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| ApiFailure::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(read_failure(response).await);
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ApiFailure::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let content = response_json
            .get("candidates")
            .and_then(|candidates| candidates.get(0))
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.get(0))
            .and_then(|part| part.get("text"))
            .and_then(|text| text.as_str())
            .ok_or_else(|| ApiFailure::MalformedResponse("No content in response".to_string()))?;

        // Gemini doesn't always provide token counts in the response
        let usage_hint = response_json
            .get("usageMetadata")
            .and_then(|u| u.get("totalTokenCount"))
            .and_then(|t| t.as_u64());

        Ok(BackendResponse {
            content: content.to_string(),
            usage_hint,
        })
    }
}
