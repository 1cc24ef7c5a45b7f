//! Application state.

use std::sync::Arc;

use tforge_queue::{JobQueue, JobStatusStore, JobSubmitter, ProgressSink};
use tforge_store::TrendSourceStore;
use tforge_worker::FeedCredentials;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub submitter: Arc<dyn JobSubmitter>,
    pub status: Arc<dyn JobStatusStore>,
    pub progress: Arc<ProgressSink>,
    pub sources: TrendSourceStore,
    /// Fallback keys that saved sources are checked against
    pub credentials: FeedCredentials,
    /// Present with the Redis backend; probed by `/ready`
    pub queue: Option<Arc<JobQueue>>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        submitter: Arc<dyn JobSubmitter>,
        status: Arc<dyn JobStatusStore>,
        progress: Arc<ProgressSink>,
        sources: TrendSourceStore,
    ) -> Self {
        Self {
            config,
            submitter,
            status,
            progress,
            sources,
            credentials: FeedCredentials::default(),
            queue: None,
        }
    }

    pub fn with_feed_credentials(mut self, credentials: FeedCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_queue(mut self, queue: Arc<JobQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn backend_name(&self) -> &'static str {
        if self.queue.is_some() {
            "redis"
        } else {
            "memory"
        }
    }
}
