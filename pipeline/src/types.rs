//! Pipeline data types: inputs, run state, results and metrics

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::{CampaignId, ClusterId, ItemId, RunId, RunStatus, RunStep};
use crate::error::{PipelineError, PipelineResult};

/// Text recorded in place of a failed generation
pub const DEFAULT_PLACEHOLDER: &str = "Error generating reaction";

/// Advertising campaign a run simulates reactions for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub description: String,
    /// Creative image as an `http(s)` or `data:` URL
    #[serde(default)]
    pub image: Option<String>,
}

/// Positive and negative reaction triggers of a persona
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionTriggers {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

/// Communication tone of a persona; every field is optional in the input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneProfile {
    pub emotional_responsiveness: Option<String>,
    pub temperament: Option<String>,
    pub communication_style: Option<String>,
    pub language_mix: Option<String>,
    pub attitude_towards_ads: Option<String>,
    pub key_reaction_triggers: Option<ReactionTriggers>,
}

/// One work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub persona_id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tone: Option<ToneProfile>,
}

/// Group of personas sharing one cluster-level reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_id: ClusterId,
    #[serde(alias = "items")]
    pub personas: Vec<Persona>,
}

impl Cluster {
    /// Description of the persona that stands in for the whole cluster
    pub fn representative(&self) -> Option<&Persona> {
        self.personas.first()
    }
}

/// Total persona count across clusters
pub fn total_items(clusters: &[Cluster]) -> usize {
    clusters.iter().map(|cluster| cluster.personas.len()).sum()
}

/// Persisted state of one pipeline execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub campaign_id: CampaignId,
    pub status: RunStatus,
    pub total_items: usize,
    pub processed_items: usize,
    pub current_step: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl Run {
    pub fn new(id: RunId, campaign_id: CampaignId, total_items: usize, now: DateTime<Utc>) -> Self {
        Self {
            id,
            campaign_id,
            status: RunStatus::Pending,
            total_items,
            processed_items: 0,
            current_step: RunStep::Initializing.to_string(),
            started_at: now,
            completed_at: None,
            error_message: None,
        }
    }

    /// Apply a partial update, enforcing the status state machine and
    /// `processed <= total`. Nothing is changed when validation fails.
    pub fn apply_update(&mut self, update: RunUpdate, now: DateTime<Utc>) -> PipelineResult<()> {
        let next_status = update.status.unwrap_or(self.status);
        if !self.status.can_transition_to(next_status) {
            return Err(PipelineError::InvalidTransition {
                from: self.status,
                to: next_status,
            });
        }

        let total = update.total_items.unwrap_or(self.total_items);
        let processed = update.processed_items.unwrap_or(self.processed_items);
        if processed > total {
            return Err(PipelineError::InvalidProgress { processed, total });
        }

        // Resuming clears the error that paused the run
        if self.status == RunStatus::Paused && next_status == RunStatus::Processing {
            self.error_message = None;
        }

        self.status = next_status;
        self.total_items = total;
        self.processed_items = processed;

        if let Some(step) = update.current_step {
            self.current_step = step.to_string();
        }
        if let Some(message) = update.error_message {
            self.error_message = Some(message);
        }
        if next_status.is_terminal() {
            self.completed_at = Some(now);
        }

        Ok(())
    }
}

/// Partial update of a run; unset fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunUpdate {
    pub status: Option<RunStatus>,
    pub total_items: Option<usize>,
    pub processed_items: Option<usize>,
    pub current_step: Option<RunStep>,
    pub error_message: Option<String>,
}

impl RunUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: RunStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn total(mut self, total: usize) -> Self {
        self.total_items = Some(total);
        self
    }

    pub fn processed(mut self, processed: usize) -> Self {
        self.processed_items = Some(processed);
        self
    }

    pub fn step(mut self, step: RunStep) -> Self {
        self.current_step = Some(step);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Run plus derived progress figures, for polling callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatusView {
    #[serde(flatten)]
    pub run: Run,
    pub progress_percent: u32,
    /// Whole minutes remaining, only while processing
    pub eta_minutes: Option<u64>,
}

/// Generated cluster-level reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub run_id: RunId,
    pub campaign_id: CampaignId,
    pub cluster_id: ClusterId,
    pub text: String,
}

/// Generated persona-level reaction, labeled once classified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub run_id: RunId,
    pub campaign_id: CampaignId,
    pub cluster_id: ClusterId,
    pub item_id: ItemId,
    pub persona_name: String,
    pub text: String,
    #[serde(default)]
    pub label: Option<EmotionLabel>,
}

/// Polarity derived from the dominant emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

/// One classifier output row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Emotion label attached to a reaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionLabel {
    pub dominant_emotion: String,
    pub sentiment: Sentiment,
    /// 0..=10
    pub intensity: u32,
    pub secondary_emotions: Vec<String>,
}

/// Reaction with its label, input to aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedResult {
    pub item_id: ItemId,
    pub persona_name: String,
    pub cluster_id: ClusterId,
    pub text: String,
    pub label: EmotionLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: String,
    pub neutral: String,
    pub negative: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCount {
    pub emotion: String,
    pub count: usize,
    pub percent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster_id: ClusterId,
    pub persona_count: usize,
    pub dominant_emotion: String,
    pub tag: String,
}

/// Aggregate of a run's labeled reactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_personas: usize,
    pub sentiment_breakdown: SentimentBreakdown,
    pub top_emotions: Vec<EmotionCount>,
    pub average_intensity: String,
    pub cluster_summaries: Vec<ClusterSummary>,
    pub high_level_tags: Vec<String>,
}

/// Run-scoped working set threaded through the stages
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub campaign: Campaign,
    pub creative_description: String,
    pub clusters: Vec<Cluster>,
    pub cluster_texts: BTreeMap<ClusterId, String>,
}

impl RunContext {
    pub fn new(run_id: RunId, campaign: Campaign, clusters: Vec<Cluster>) -> Self {
        Self {
            run_id,
            creative_description: campaign.description.clone(),
            campaign,
            clusters,
            cluster_texts: BTreeMap::new(),
        }
    }

    pub fn total_items(&self) -> usize {
        total_items(&self.clusters)
    }
}

/// Pipeline tuning knobs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Delay before a paused run is restarted
    pub resume_delay: Duration,
    /// Give up (status `failed`) after this many automatic resumes; unbounded when `None`
    pub max_resume_attempts: Option<u32>,
    /// Pause between classifier calls
    pub classification_delay: Duration,
    /// Log progress and provider status every this many items
    pub progress_log_interval: usize,
    /// Text recorded for failed generations
    pub placeholder: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resume_delay: Duration::from_secs(60),
            max_resume_attempts: None,
            classification_delay: Duration::from_millis(100),
            progress_log_interval: 50,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Whether a stored text is a real generation rather than a failure marker
    pub fn is_completed_text(&self, text: &str) -> bool {
        let trimmed = text.trim();
        !trimmed.is_empty() && trimmed != self.placeholder
    }
}
