//! Work unit sources: clustering output read from disk or held in memory

use std::path::{Path, PathBuf};

use serde::Deserialize;

use shared::CampaignId;
use crate::error::PipelineResult;
use crate::traits::WorkUnitSource;
use crate::types::Cluster;

/// Accepted file layouts: `{"clusters": [...]}` or a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum ClusterFile {
    Wrapped { clusters: Vec<Cluster> },
    Bare(Vec<Cluster>),
}

impl ClusterFile {
    fn into_clusters(self) -> Vec<Cluster> {
        match self {
            ClusterFile::Wrapped { clusters } | ClusterFile::Bare(clusters) => clusters,
        }
    }
}

/// Parse clustering output from JSON text
pub fn parse_clusters(json: &str) -> PipelineResult<Vec<Cluster>> {
    let file: ClusterFile = serde_json::from_str(json)?;
    Ok(file.into_clusters())
}

/// Reads the clustering output from a JSON file on every load
pub struct FileWorkUnitSource {
    path: PathBuf,
}

impl FileWorkUnitSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl WorkUnitSource for FileWorkUnitSource {
    async fn load_work_units(&self, campaign_id: &CampaignId) -> PipelineResult<Vec<Cluster>> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        let clusters = parse_clusters(&json)?;
        tracing::debug!(
            "📂 Loaded {} clusters for campaign {} from {}",
            clusters.len(),
            campaign_id,
            self.path.display()
        );
        Ok(clusters)
    }
}

/// Fixed clusters, shared by every campaign
#[derive(Debug, Clone, Default)]
pub struct StaticWorkUnitSource {
    clusters: Vec<Cluster>,
}

impl StaticWorkUnitSource {
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }
}

#[async_trait::async_trait]
impl WorkUnitSource for StaticWorkUnitSource {
    async fn load_work_units(&self, _campaign_id: &CampaignId) -> PipelineResult<Vec<Cluster>> {
        Ok(self.clusters.clone())
    }
}
