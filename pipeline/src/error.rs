//! Pipeline-specific error types

use thiserror::Error;

use dispatcher::DispatchError;
use shared::{CampaignId, RunId, RunStatus};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No work units found for campaign {campaign_id}")]
    NoWorkUnits { campaign_id: CampaignId },

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: RunId },

    #[error("Campaign not found: {campaign_id}")]
    CampaignNotFound { campaign_id: CampaignId },

    #[error("Campaign already exists: {campaign_id}")]
    CampaignExists { campaign_id: CampaignId },

    #[error("No persona reactions found for {run_id}")]
    NoItemResults { run_id: RunId },

    #[error("No labeled reactions to aggregate")]
    NoLabeledResults,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: RunStatus, to: RunStatus },

    #[error("Processed count {processed} exceeds total {total}")]
    InvalidProgress { processed: usize, total: usize },

    #[error("Storage operation failed: {message}")]
    StorageError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
