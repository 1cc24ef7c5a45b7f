//! Job requests, handles and status records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{RunResult, StyleChoice};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_enable_interaction() -> bool {
    true
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// A request to produce one video for a niche.
///
/// Accepts both the camelCase names and the legacy snake_case
/// `lang` / `enable_interaction` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// Topic domain driving trend collection (e.g. "space travel")
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub niche: String,

    /// Visual style, or `auto` to pick one from the topic
    #[serde(default)]
    pub style: StyleChoice,

    /// Narration language code
    #[serde(default = "default_language", alias = "lang")]
    #[validate(length(min = 2, max = 16))]
    pub language: String,

    /// Whether to generate a poll and call-to-action
    #[serde(default = "default_enable_interaction", alias = "enable_interaction")]
    pub enable_interaction: bool,
}

impl JobRequest {
    /// Create a request with default style, language and interaction.
    pub fn new(niche: impl Into<String>) -> Self {
        Self {
            niche: niche.into(),
            style: StyleChoice::Auto,
            language: default_language(),
            enable_interaction: default_enable_interaction(),
        }
    }

    pub fn with_style(mut self, style: StyleChoice) -> Self {
        self.style = style;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_interaction(mut self, enabled: bool) -> Self {
        self.enable_interaction = enabled;
        self
    }
}

/// Job lifecycle state as reported by the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, waiting for an executor (also reported for unknown handles)
    #[default]
    Pending,
    /// An executor is running the pipeline
    Started,
    /// Pipeline finished with a full result
    Success,
    /// A stage failed; no result is stored
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Started => "started",
            JobState::Success => "success",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest known state of a job, keyed by its handle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusRecord {
    pub job_id: JobId,
    pub state: JobState,
    pub request: JobRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RunResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobStatusRecord {
    /// Record for a freshly submitted job.
    pub fn pending(job_id: JobId, request: JobRequest) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            state: JobState::Pending,
            request,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the job as picked up by an executor.
    pub fn started(mut self) -> Self {
        self.state = JobState::Started;
        self.updated_at = Utc::now();
        self
    }

    /// Attach the final result.
    pub fn succeeded(mut self, result: RunResult) -> Self {
        self.state = JobState::Success;
        self.result = Some(result);
        self.error = None;
        self.updated_at = Utc::now();
        self
    }

    /// Mark the job as failed. Any partial result is discarded.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.state = JobState::Failed;
        self.result = None;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_generation() {
        let id1 = JobId::new();
        let id2 = JobId::new();
        assert_ne!(id1, id2);
        assert!(Uuid::parse_str(id1.as_str()).is_ok());
    }

    #[test]
    fn test_request_defaults() {
        let request: JobRequest = serde_json::from_str(r#"{"niche": "space travel"}"#).unwrap();
        assert_eq!(request.niche, "space travel");
        assert_eq!(request.style, StyleChoice::Auto);
        assert_eq!(request.language, "en");
        assert!(request.enable_interaction);
    }

    #[test]
    fn test_request_accepts_legacy_field_names() {
        let request: JobRequest = serde_json::from_str(
            r#"{"niche": "cooking", "style": "retro", "lang": "fr", "enable_interaction": false}"#,
        )
        .unwrap();
        assert_eq!(request.style, StyleChoice::Explicit("retro".to_string()));
        assert_eq!(request.language, "fr");
        assert!(!request.enable_interaction);

        let camel: JobRequest =
            serde_json::from_str(r#"{"niche": "cooking", "enableInteraction": false}"#).unwrap();
        assert!(!camel.enable_interaction);
    }

    #[test]
    fn test_request_validation() {
        assert!(JobRequest::new("space travel").validate().is_ok());
        assert!(JobRequest::new("").validate().is_err());
        assert!(JobRequest::new("   ").validate().is_err());
        assert!(JobRequest::new("a".repeat(201)).validate().is_err());
    }

    #[test]
    fn test_status_transitions() {
        let record = JobStatusRecord::pending(JobId::new(), JobRequest::new("robots"));
        assert_eq!(record.state, JobState::Pending);
        assert!(!record.state.is_terminal());

        let started = record.started();
        assert_eq!(started.state, JobState::Started);

        let failed = started.failed("trend collection: upstream returned 503");
        assert_eq!(failed.state, JobState::Failed);
        assert!(failed.state.is_terminal());
        assert!(failed.result.is_none());
        assert_eq!(
            failed.error.as_deref(),
            Some("trend collection: upstream returned 503")
        );
    }

    #[test]
    fn test_job_state_serialization() {
        assert_eq!(serde_json::to_string(&JobState::Success).unwrap(), "\"success\"");
        assert_eq!(JobState::Started.to_string(), "started");
    }
}
