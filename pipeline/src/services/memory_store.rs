//! In-process run store
//!
//! Keeps campaigns, runs, results and metrics in memory behind one lock.
//! Every status change is also appended to a per-run history so callers can
//! inspect the path a run took through the state machine.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;

use shared::{CampaignId, ClusterId, ItemId, RunId, RunStatus};
use crate::error::{PipelineError, PipelineResult};
use crate::traits::RunStore;
use crate::types::{Campaign, ClusterResult, EmotionLabel, ItemResult, Metrics, Run, RunUpdate};

#[derive(Default)]
struct StoreState {
    next_run_id: u64,
    campaigns: HashMap<CampaignId, Campaign>,
    runs: HashMap<RunId, Run>,
    status_history: HashMap<RunId, Vec<RunStatus>>,
    cluster_results: BTreeMap<(RunId, ClusterId), ClusterResult>,
    item_results: HashMap<RunId, Vec<ItemResult>>,
    metrics: HashMap<RunId, Metrics>,
}

/// Run store backed by process memory
#[derive(Default)]
pub struct InMemoryRunStore {
    state: RwLock<StoreState>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses the run has been in, oldest first
    pub async fn status_history(&self, run_id: RunId) -> Vec<RunStatus> {
        self.state
            .read()
            .await
            .status_history
            .get(&run_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl RunStore for InMemoryRunStore {
    async fn create_campaign(&self, campaign: Campaign) -> PipelineResult<()> {
        let mut state = self.state.write().await;
        if state.campaigns.contains_key(&campaign.id) {
            return Err(PipelineError::CampaignExists {
                campaign_id: campaign.id,
            });
        }
        state.campaigns.insert(campaign.id.clone(), campaign);
        Ok(())
    }

    async fn load_campaign(&self, campaign_id: &CampaignId) -> PipelineResult<Campaign> {
        self.state
            .read()
            .await
            .campaigns
            .get(campaign_id)
            .cloned()
            .ok_or_else(|| PipelineError::CampaignNotFound {
                campaign_id: campaign_id.clone(),
            })
    }

    async fn create_run(&self, campaign_id: &CampaignId, total_items: usize) -> PipelineResult<RunId> {
        let mut state = self.state.write().await;
        if !state.campaigns.contains_key(campaign_id) {
            return Err(PipelineError::CampaignNotFound {
                campaign_id: campaign_id.clone(),
            });
        }

        state.next_run_id += 1;
        let run_id = RunId::new(state.next_run_id);
        let run = Run::new(run_id, campaign_id.clone(), total_items, Utc::now());

        state.status_history.insert(run_id, vec![run.status]);
        state.runs.insert(run_id, run);
        Ok(run_id)
    }

    async fn update_run(&self, run_id: RunId, update: RunUpdate) -> PipelineResult<Run> {
        let mut state = self.state.write().await;
        let run = state
            .runs
            .get_mut(&run_id)
            .ok_or(PipelineError::RunNotFound { run_id })?;

        let previous = run.status;
        run.apply_update(update, Utc::now())?;
        let updated = run.clone();

        if updated.status != previous {
            state.status_history.entry(run_id).or_default().push(updated.status);
        }
        Ok(updated)
    }

    async fn get_run(&self, run_id: RunId) -> PipelineResult<Run> {
        self.state
            .read()
            .await
            .runs
            .get(&run_id)
            .cloned()
            .ok_or(PipelineError::RunNotFound { run_id })
    }

    async fn save_cluster_result(&self, result: ClusterResult) -> PipelineResult<()> {
        let mut state = self.state.write().await;
        state.cluster_results.insert((result.run_id, result.cluster_id), result);
        Ok(())
    }

    async fn load_cluster_results(&self, run_id: RunId) -> PipelineResult<Vec<ClusterResult>> {
        let state = self.state.read().await;
        Ok(state
            .cluster_results
            .range((run_id, ClusterId::new(0))..=(run_id, ClusterId::new(u32::MAX)))
            .map(|(_, result)| result.clone())
            .collect())
    }

    async fn save_item_result(&self, result: ItemResult) -> PipelineResult<()> {
        let mut state = self.state.write().await;
        let rows = state.item_results.entry(result.run_id).or_default();
        match rows.iter_mut().find(|row| row.item_id == result.item_id) {
            Some(row) => *row = result,
            None => rows.push(result),
        }
        Ok(())
    }

    async fn load_item_results(&self, run_id: RunId) -> PipelineResult<Vec<ItemResult>> {
        let state = self.state.read().await;
        Ok(state.item_results.get(&run_id).cloned().unwrap_or_default())
    }

    async fn save_item_label(&self, run_id: RunId, item_id: &ItemId, label: EmotionLabel) -> PipelineResult<()> {
        let mut state = self.state.write().await;
        let row = state
            .item_results
            .get_mut(&run_id)
            .and_then(|rows| rows.iter_mut().find(|row| &row.item_id == item_id))
            .ok_or_else(|| PipelineError::StorageError {
                message: format!("No reaction stored for {item_id} in {run_id}"),
            })?;
        row.label = Some(label);
        Ok(())
    }

    async fn save_metrics(&self, run_id: RunId, metrics: Metrics) -> PipelineResult<()> {
        self.state.write().await.metrics.insert(run_id, metrics);
        Ok(())
    }

    async fn load_metrics(&self, run_id: RunId) -> PipelineResult<Option<Metrics>> {
        Ok(self.state.read().await.metrics.get(&run_id).cloned())
    }
}
