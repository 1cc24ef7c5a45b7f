//! Job submission and status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use tforge_models::{JobId, JobRequest, JobState, JobStatusRecord, RunResult};
use tforge_queue::GenerateVideoJob;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Failure text reported in production instead of the real cause.
const HIDDEN_FAILURE: &str = "Job failed";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub status: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RunResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusResponse {
    fn pending() -> Self {
        Self {
            status: JobState::Pending,
            result: None,
            error: None,
        }
    }

    fn from_record(record: JobStatusRecord, hide_errors: bool) -> Self {
        let error = match record.state {
            JobState::Failed if hide_errors => Some(HIDDEN_FAILURE.to_string()),
            JobState::Failed => record.error,
            _ => None,
        };
        let result = match record.state {
            JobState::Success => record.result,
            _ => None,
        };
        Self {
            status: record.state,
            result,
            error,
        }
    }
}

/// Handles are UUIDs in practice; accept any short id-shaped token.
fn is_valid_job_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Accept a job and return its handle without waiting for any stage.
pub async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    request.validate()?;

    let job = GenerateVideoJob::new(request);
    let job_id = job.job_id.clone();

    // The record must exist before an executor can pick the job up
    let record = JobStatusRecord::pending(job_id.clone(), job.request.clone());
    state.status.put(&record).await?;

    if let Err(e) = state.submitter.submit(job).await {
        // Nothing will ever run this job; don't leave it reading as pending
        if let Err(put_err) = state.status.put(&record.failed(e.to_string())).await {
            warn!(job_id = %job_id, error = %put_err, "Failed to mark unsubmitted job as failed");
        }
        warn!(job_id = %job_id, error = %e, "Job submission failed");
        return Err(e.into());
    }

    metrics::record_job_submitted(state.backend_name());
    info!(job_id = %job_id, "Job submitted");

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id })))
}

/// Latest state of a job. Unknown handles read as pending.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    if !is_valid_job_id(&job_id) {
        return Err(ApiError::bad_request("Invalid job id"));
    }

    let response = match state.status.get(&JobId::from_string(job_id)).await? {
        Some(record) => JobStatusResponse::from_record(record, state.config.is_production()),
        None => JobStatusResponse::pending(),
    };
    Ok(Json(response))
}
