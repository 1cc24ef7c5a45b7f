//! Worker metrics.

use metrics::{counter, histogram};

use crate::agents::Stage;

pub mod names {
    pub const STAGE_DURATION_SECONDS: &str = "tforge_stage_duration_seconds";
    pub const STAGE_FAILURES_TOTAL: &str = "tforge_stage_failures_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "tforge_jobs_completed_total";
    pub const JOB_DURATION_SECONDS: &str = "tforge_job_duration_seconds";
}

pub fn record_stage(stage: Stage, duration_secs: f64, success: bool) {
    let labels = [
        ("stage", stage.as_str().to_string()),
        ("status", if success { "ok" } else { "error" }.to_string()),
    ];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
    if !success {
        counter!(names::STAGE_FAILURES_TOTAL, "stage" => stage.as_str()).increment(1);
    }
}

pub fn record_job(success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "failed" };
    counter!(names::JOBS_COMPLETED_TOTAL, "status" => status).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "status" => status).record(duration_secs);
}
