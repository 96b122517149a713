//! Trait definitions with mockall annotations for testing
//!
//! These are the seams between the run controller and its collaborators:
//! persistence, the clustering output and the emotion classifier. Text
//! generation goes through `dispatcher::Dispatcher`.

use shared::{ApiFailure, CampaignId, ItemId, RunId};
use crate::error::PipelineResult;
use crate::types::{Campaign, Cluster, ClusterResult, EmotionLabel, ItemResult, LabelScore, Metrics, Run, RunUpdate};

/// Persistence of campaigns, runs, per-record results and metrics
#[mockall::automock]
#[async_trait::async_trait]
pub trait RunStore: Send + Sync {
    /// Register a campaign; fails with `CampaignExists` for a known id
    async fn create_campaign(&self, campaign: Campaign) -> PipelineResult<()>;

    async fn load_campaign(&self, campaign_id: &CampaignId) -> PipelineResult<Campaign>;

    /// Create a run in `pending` status
    async fn create_run(&self, campaign_id: &CampaignId, total_items: usize) -> PipelineResult<RunId>;

    /// Apply a validated partial update and return the new state
    async fn update_run(&self, run_id: RunId, update: RunUpdate) -> PipelineResult<Run>;

    async fn get_run(&self, run_id: RunId) -> PipelineResult<Run>;

    /// Upsert keyed by `(run, cluster)`
    async fn save_cluster_result(&self, result: ClusterResult) -> PipelineResult<()>;

    async fn load_cluster_results(&self, run_id: RunId) -> PipelineResult<Vec<ClusterResult>>;

    /// Upsert keyed by `(run, item)`; rows keep their first insertion order
    async fn save_item_result(&self, result: ItemResult) -> PipelineResult<()>;

    async fn load_item_results(&self, run_id: RunId) -> PipelineResult<Vec<ItemResult>>;

    /// Attach a label to a stored item result
    async fn save_item_label(&self, run_id: RunId, item_id: &ItemId, label: EmotionLabel) -> PipelineResult<()>;

    /// Upsert; recomputing overwrites the previous aggregate
    async fn save_metrics(&self, run_id: RunId, metrics: Metrics) -> PipelineResult<()>;

    async fn load_metrics(&self, run_id: RunId) -> PipelineResult<Option<Metrics>>;
}

/// Supplier of the clustering output for a campaign
#[mockall::automock]
#[async_trait::async_trait]
pub trait WorkUnitSource: Send + Sync {
    async fn load_work_units(&self, campaign_id: &CampaignId) -> PipelineResult<Vec<Cluster>>;
}

/// External emotion classifier: one text in, one score per label out
#[mockall::automock]
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Vec<LabelScore>, ApiFailure>;
}
