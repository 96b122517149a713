//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SharedError;

/// Identifier of one pipeline execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run_{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("run_").unwrap_or(s);
        digits
            .parse::<u64>()
            .map(RunId)
            .map_err(|_| SharedError::InvalidIdentifier {
                kind: "run".to_string(),
                input: s.to_string(),
            })
    }
}

/// Identifier of the campaign a run belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a persona cluster (numeric in the clustering output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u32);

impl ClusterId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one work item (a persona)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Processing,
    Paused,
    Completed,
    Failed,
}

impl RunStatus {
    /// Completed and failed runs accept no further mutation
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Re-asserting the current (non-terminal) status is always allowed so
    /// progress updates can carry the status along.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::Processing)
                | (RunStatus::Pending, RunStatus::Failed)
                | (RunStatus::Processing, RunStatus::Paused)
                | (RunStatus::Processing, RunStatus::Completed)
                | (RunStatus::Processing, RunStatus::Failed)
                | (RunStatus::Paused, RunStatus::Processing)
                | (RunStatus::Paused, RunStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Processing => "processing",
            RunStatus::Paused => "paused",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text "current step" label carried by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStep {
    Initializing,
    Bootstrap,
    AnalyzingCreative,
    ClusterStage { current: usize, total: usize },
    ItemStage { current: usize, total: usize },
    Classification,
    Aggregation,
    Complete,
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStep::Initializing => write!(f, "Initializing"),
            RunStep::Bootstrap => write!(f, "Loading clusters"),
            RunStep::AnalyzingCreative => write!(f, "Analyzing advertisement"),
            RunStep::ClusterStage { current, total } => {
                write!(f, "Generating cluster reactions ({current}/{total})")
            }
            RunStep::ItemStage { current, total } => {
                write!(f, "Generating persona reactions ({current}/{total})")
            }
            RunStep::Classification => write!(f, "Running emotional analysis"),
            RunStep::Aggregation => write!(f, "Aggregating metrics"),
            RunStep::Complete => write!(f, "Complete"),
        }
    }
}

/// Coarse classification of a backend failure, used for quota bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    RateLimited,
    QuotaExhausted,
    Other,
}

/// Failure reasons reported by text-generation and classification backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiFailure {
    /// Authentication failed (invalid API key)
    AuthenticationFailed,
    /// Per-minute request rate exceeded
    RateLimitExceeded,
    /// Daily token or request quota exhausted
    QuotaExceeded,
    /// Invalid request format or parameters
    InvalidRequest(String),
    /// Network/connection error
    NetworkError(String),
    /// Server error from provider
    ServerError(String),
    /// Response could not be interpreted
    MalformedResponse(String),
    /// Service temporarily unavailable
    ServiceUnavailable,
}

impl ApiFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiFailure::RateLimitExceeded => FailureKind::RateLimited,
            ApiFailure::QuotaExceeded => FailureKind::QuotaExhausted,
            _ => FailureKind::Other,
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::AuthenticationFailed => write!(f, "authentication failed"),
            ApiFailure::RateLimitExceeded => write!(f, "rate limit exceeded"),
            ApiFailure::QuotaExceeded => write!(f, "daily quota exhausted"),
            ApiFailure::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            ApiFailure::NetworkError(msg) => write!(f, "network error: {msg}"),
            ApiFailure::ServerError(msg) => write!(f, "server error: {msg}"),
            ApiFailure::MalformedResponse(msg) => write!(f, "malformed response: {msg}"),
            ApiFailure::ServiceUnavailable => write!(f, "service unavailable"),
        }
    }
}
