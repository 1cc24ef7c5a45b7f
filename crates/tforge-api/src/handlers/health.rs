//! Liveness and readiness probes.

use std::future::Future;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub store: CheckStatus,
    /// Present only with the Redis queue backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<CheckStatus>,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn passed(&self) -> bool {
        self.error.is_none()
    }
}

async fn probe<F>(check: F) -> CheckStatus
where
    F: Future<Output = Result<(), String>>,
{
    let start = Instant::now();
    match check.await {
        Ok(()) => CheckStatus {
            status: "ok",
            error: None,
            latency_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(error) => CheckStatus {
            status: "error",
            error: Some(error),
            latency_ms: None,
        },
    }
}

/// 200 when every dependency answers, 503 with the same body otherwise.
pub async fn ready(State(state): State<AppState>) -> Response {
    let sources = state.sources.clone();
    let store = probe(async move {
        match tokio::task::spawn_blocking(move || sources.list()).await {
            Ok(listed) => listed.map(|_| ()).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        }
    })
    .await;

    let redis = match &state.queue {
        Some(queue) => Some(probe(async { queue.ping().await.map_err(|e| e.to_string()) }).await),
        None => None,
    };

    let ready = store.passed() && redis.as_ref().map_or(true, CheckStatus::passed);
    let (code, status) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = ReadinessResponse {
        status,
        checks: ReadinessChecks { store, redis },
    };
    (code, Json(body)).into_response()
}
