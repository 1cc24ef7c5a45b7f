//! Worker error types.

use thiserror::Error;

use tforge_clients::ClientError;
use tforge_media::MediaError;
use tforge_models::ParseError;
use tforge_queue::QueueError;
use tforge_store::StoreError;

use crate::agents::Stage;

pub type StageResult<T> = Result<T, StageError>;
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failure inside one stage-agent.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("{0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trend source store: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed output: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl StageError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

impl From<ParseError> for StageError {
    fn from(e: ParseError) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<tokio::task::JoinError> for StageError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: StageError,
    },

    #[error("{stage} timed out after {secs}s")]
    StageTimeout { stage: Stage, secs: u64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Client setup failed: {0}")]
    Client(#[from] ClientError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn stage(stage: Stage, source: StageError) -> Self {
        Self::Stage { stage, source }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Stage that failed, if the error came from the pipeline.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            WorkerError::Stage { stage, .. } | WorkerError::StageTimeout { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
