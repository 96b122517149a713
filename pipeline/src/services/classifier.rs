//! Hugging Face inference client for emotion classification

use async_trait::async_trait;
use reqwest::Client;

use dispatcher::failure_from_status;
use shared::ApiFailure;
use crate::error::{PipelineError, PipelineResult};
use crate::traits::Classifier;
use crate::types::LabelScore;

const HF_BASE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Default emotion model
pub const EMOTION_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";

/// Real classifier calling the hosted emotion model
pub struct RealEmotionClassifier {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl RealEmotionClassifier {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: EMOTION_MODEL.to_string(),
            base_url: HF_BASE_URL.to_string(),
        }
    }

    /// Read `HF_API_KEY` from `.env` or the environment
    pub fn from_env() -> PipelineResult<Self> {
        let _ = dotenv::dotenv();
        std::env::var("HF_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
            .ok_or_else(|| PipelineError::ConfigError {
                message: "HF_API_KEY is not set".to_string(),
            })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Classifier for RealEmotionClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<LabelScore>, ApiFailure> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, self.model))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| ApiFailure::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(failure_from_status(status, &body));
        }

        // Response shape: [[{"label": "joy", "score": 0.9}, ...]]
        let mut batches: Vec<Vec<LabelScore>> = response
            .json()
            .await
            .map_err(|e| ApiFailure::MalformedResponse(format!("Unexpected classifier response: {e}")))?;

        match batches.first() {
            Some(scores) if !scores.is_empty() => Ok(batches.swap_remove(0)),
            _ => Err(ApiFailure::MalformedResponse("Empty classifier response".to_string())),
        }
    }
}
