//! Job payload carried by the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tforge_models::{JobId, JobRequest};

/// One video-generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateVideoJob {
    pub job_id: JobId,
    pub request: JobRequest,
    pub created_at: DateTime<Utc>,
}

impl GenerateVideoJob {
    /// Create a job with a fresh id.
    pub fn new(request: JobRequest) -> Self {
        Self::with_id(JobId::new(), request)
    }

    pub fn with_id(job_id: JobId, request: JobRequest) -> Self {
        Self {
            job_id,
            request,
            created_at: Utc::now(),
        }
    }
}
