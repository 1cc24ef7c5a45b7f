//! Job-scoped structured logging.

use std::time::Duration;

use tracing::{error, info, Span};

use tforge_models::{JobId, JobRequest, RunResult};

use crate::agents::Stage;
use crate::error::WorkerError;

/// Emits the lifecycle events of one pipeline run, each tagged with the job id.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: JobId,
    niche: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, request: &JobRequest) -> Self {
        Self {
            job_id: job_id.clone(),
            niche: request.niche.clone(),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Span covering the whole run.
    pub fn span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, niche = %self.niche)
    }

    pub fn started(&self, request: &JobRequest) {
        info!(
            job_id = %self.job_id,
            operation = "start",
            style = %request.style,
            language = %request.language,
            interaction = request.enable_interaction,
            "Pipeline started for niche '{}'", self.niche
        );
    }

    pub fn progress(&self, line: &str) {
        info!(job_id = %self.job_id, operation = "progress", "{}", line);
    }

    pub fn stage_finished(&self, stage: Stage, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            operation = "stage",
            stage = stage.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Stage finished"
        );
    }

    pub fn failed(&self, err: &WorkerError) {
        error!(
            job_id = %self.job_id,
            operation = "error",
            stage = err.failed_stage().map_or("none", |s| s.as_str()),
            "Pipeline failed: {}", err
        );
    }

    pub fn completed(&self, result: &RunResult, elapsed: Duration) {
        info!(
            job_id = %self.job_id,
            operation = "complete",
            topic = %result.topic,
            video = %result.video.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Pipeline completed"
        );
    }
}
