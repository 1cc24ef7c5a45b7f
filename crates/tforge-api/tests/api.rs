//! Router-level tests against in-memory backends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use tforge_api::{create_router, ApiConfig, AppState};
use tforge_models::{
    ArtifactKind, JobId, JobRequest, JobState, JobStatusRecord, MediaArtifact, RunResult, Sentiment,
    TrendBundle, UploadMetadata,
};
use tforge_queue::{
    GenerateVideoJob, JobStatusStore, JobSubmitter, LocalQueue, MemoryStatusStore, ProgressPublisher,
    ProgressSink, QueueResult,
};
use tforge_store::TrendSourceStore;
use tforge_worker::FeedCredentials;

/// Completes every job shortly after submission. Niches containing "fail"
/// end up failed.
struct InstantWorker {
    status: Arc<MemoryStatusStore>,
    sink: Arc<ProgressSink>,
}

#[async_trait]
impl JobSubmitter for InstantWorker {
    async fn submit(&self, job: GenerateVideoJob) -> QueueResult<()> {
        let status = Arc::clone(&self.status);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let record = status.get(&job.job_id).await.unwrap().unwrap().started();
            status.put(&record).await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;

            let done = if job.request.niche.contains("fail") {
                record.failed("script_generation failed: Request failed with status 401: invalid key")
            } else {
                sink.log(&job.job_id, "Workflow completed".to_string()).await.unwrap();
                record.succeeded(result_for(&job.request))
            };
            status.put(&done).await.unwrap();
        });
        Ok(())
    }
}

fn result_for(request: &JobRequest) -> RunResult {
    let artifact = |kind: ArtifactKind, name: &str| {
        MediaArtifact::new(kind, format!("assets/{}/{}", kind.dir_name(), name))
    };
    RunResult {
        niche: request.niche.clone(),
        trends: TrendBundle::new(request.niche.as_str()),
        topic: "Mars landing".to_string(),
        sentiment: Sentiment::Positive,
        script: "Mars is closer than ever.".to_string(),
        style: "futuristic".to_string(),
        thumbnail: artifact(ArtifactKind::Thumbnail, "thumbnail_1.png"),
        background: artifact(ArtifactKind::Background, "background_1.png"),
        audio: artifact(ArtifactKind::Audio, "voiceover_1.mp3"),
        video: artifact(ArtifactKind::Video, "video_1.mp4"),
        interaction: None,
        upload: UploadMetadata::build("Mars landing", "Mars is closer than ever.", None),
        metadata: artifact(ArtifactKind::Metadata, "metadata_1.json"),
    }
}

struct TestApp {
    router: Router,
    sink: Arc<ProgressSink>,
}

fn seeded_sources() -> TrendSourceStore {
    let sources = TrendSourceStore::open_in_memory().unwrap();
    sources.seed_defaults(None).unwrap();
    sources
}

fn app_with(config: ApiConfig) -> TestApp {
    app_with_credentials(config, FeedCredentials::default())
}

fn app_with_credentials(config: ApiConfig, credentials: FeedCredentials) -> TestApp {
    let status = Arc::new(MemoryStatusStore::new());
    let sink = Arc::new(ProgressSink::new());

    let worker = InstantWorker {
        status: Arc::clone(&status),
        sink: Arc::clone(&sink),
    };
    let state = AppState::new(config, Arc::new(worker), status, Arc::clone(&sink), seeded_sources())
        .with_feed_credentials(credentials);

    TestApp {
        router: create_router(state, None),
        sink,
    }
}

fn app() -> TestApp {
    app_with(ApiConfig::default())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn wait_for_terminal(router: &Router, uri: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = send(router, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == "success" || body["status"] == "failed" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job never finished: {}", uri);
}

#[tokio::test]
async fn test_submit_then_poll_to_success() {
    let app = app();
    let mut sub = app.sink.register();

    let (status, body) = send(
        &app.router,
        with_json(
            Method::POST,
            "/api/jobs",
            json!({"niche": "space travel", "style": "auto", "language": "en", "enableInteraction": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let done = wait_for_terminal(&app.router, &format!("/api/jobs/{}/status", job_id)).await;
    assert_eq!(done["status"], "success");
    assert_eq!(done["result"]["niche"], "space travel");
    assert_eq!(done["result"]["topic"], "Mars landing");
    assert!(done.get("error").is_none());

    let (_, legacy) = send(&app.router, get(&format!("/task_status/{}", job_id))).await;
    assert_eq!(legacy, done);

    let frame = sub.receiver.try_recv().unwrap();
    assert_eq!(frame.message(), "Workflow completed");
}

#[tokio::test]
async fn test_legacy_submit_accepts_snake_case_fields() {
    let app = app();
    let (status, body) = send(
        &app.router,
        with_json(
            Method::POST,
            "/start_workflow",
            json!({"niche": "cooking", "style": "retro", "lang": "fr", "enable_interaction": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body["jobId"].is_string());
}

#[tokio::test]
async fn test_blank_niche_is_rejected() {
    let app = app();
    let (status, body) = send(&app.router, with_json(Method::POST, "/api/jobs", json!({"niche": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");
}

#[tokio::test]
async fn test_unknown_job_reads_pending() {
    let app = app();
    let (status, body) = send(&app.router, get("/api/jobs/00000000-0000-0000-0000-000000000000/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "pending"}));

    let (status, _) = send(&app.router, get("/task_status/not.an.id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_job_reports_error() {
    let app = app();
    let (_, body) = send(&app.router, with_json(Method::POST, "/api/jobs", json!({"niche": "fail fast"}))).await;
    let uri = format!("/api/jobs/{}/status", body["jobId"].as_str().unwrap());

    let done = wait_for_terminal(&app.router, &uri).await;
    assert_eq!(done["status"], "failed");
    assert!(done["error"].as_str().unwrap().contains("invalid key"));
    assert!(done.get("result").is_none());
}

#[tokio::test]
async fn test_failed_job_hides_cause_in_production() {
    let config = ApiConfig {
        environment: "production".to_string(),
        ..ApiConfig::default()
    };
    let app = app_with(config);
    let (_, body) = send(&app.router, with_json(Method::POST, "/api/jobs", json!({"niche": "fail again"}))).await;
    let uri = format!("/api/jobs/{}/status", body["jobId"].as_str().unwrap());

    let done = wait_for_terminal(&app.router, &uri).await;
    assert_eq!(done["status"], "failed");
    assert_eq!(done["error"], "Job failed");
}

#[tokio::test]
async fn test_source_administration() {
    let app = app();

    let (status, body) = send(&app.router, get("/api/sources")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body.as_array().unwrap().iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Google Trends", "YouTube Trends"]);

    let (status, body) = send(
        &app.router,
        with_json(
            Method::PUT,
            "/api/sources",
            json!({"name": "X Trends", "url": "https://x.com", "apiKey": "bearer"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasApiKey"], true);
    assert!(body.get("apiKey").is_none());

    let (_, body) = send(&app.router, get("/api/sources")).await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 3);
    assert!(listed.iter().all(|s| s.get("apiKey").is_none()));
    assert_eq!(listed[0]["hasApiKey"], false);
    assert_eq!(listed[2]["hasApiKey"], true);
    assert!(!body.to_string().contains("bearer"));

    let delete = |uri: &str| Request::builder().method(Method::DELETE).uri(uri).body(Body::empty()).unwrap();
    let (status, _) = send(&app.router, delete("/api/sources/X%20Trends")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app.router, delete("/api/sources/X%20Trends")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_keyed_source_needs_a_usable_key() {
    let google = json!({"name": "Google Trends", "url": "https://trends.google.com"});

    let app = app();
    let (status, body) = send(&app.router, with_json(Method::PUT, "/api/sources", google.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("SERPAPI_API_KEY"));

    let keyed = app_with_credentials(
        ApiConfig::default(),
        FeedCredentials {
            serpapi: Some("serp-test".to_string()),
            ..Default::default()
        },
    );
    let (status, body) = send(&keyed.router, with_json(Method::PUT, "/api/sources", google)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasApiKey"], false);
}

/// Keeps every record written, in order.
#[derive(Default)]
struct RecordingStatus {
    writes: Mutex<Vec<JobStatusRecord>>,
}

#[async_trait]
impl JobStatusStore for RecordingStatus {
    async fn put(&self, record: &JobStatusRecord) -> QueueResult<()> {
        self.writes.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> QueueResult<Option<JobStatusRecord>> {
        let writes = self.writes.lock().unwrap();
        Ok(writes.iter().rev().find(|r| &r.job_id == job_id).cloned())
    }
}

#[tokio::test]
async fn test_failed_submission_does_not_stay_pending() {
    let status = Arc::new(RecordingStatus::default());
    let (queue, receiver) = LocalQueue::channel();
    drop(receiver);
    let state = AppState::new(
        ApiConfig::default(),
        Arc::new(queue),
        status.clone(),
        Arc::new(ProgressSink::new()),
        seeded_sources(),
    );
    let router = create_router(state, None);

    let (code, body) = send(&router, with_json(Method::POST, "/api/jobs", json!({"niche": "space"}))).await;
    assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "queue_unavailable");

    let writes = status.writes.lock().unwrap().clone();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].state, JobState::Pending);
    assert_eq!(writes[1].state, JobState::Failed);
    assert_eq!(writes[1].job_id, writes[0].job_id);

    let uri = format!("/api/jobs/{}/status", writes[0].job_id);
    let (code, body) = send(&router, get(&uri)).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "failed");
}

#[tokio::test]
async fn test_source_with_bad_url_is_rejected() {
    let app = app();
    let (status, _) = send(
        &app.router,
        with_json(Method::PUT, "/api/sources", json!({"name": "Custom", "url": "not a url"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = app();

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app.router, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["store"]["status"], "ok");
    assert!(body["checks"].get("redis").is_none());
}

#[tokio::test]
async fn test_common_headers() {
    let app = app();
    let response = app.router.clone().oneshot(get("/healthz")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["X-Content-Type-Options"], "nosniff");
    assert_eq!(headers["X-Frame-Options"], "DENY");
    assert!(headers.contains_key("X-Request-ID"));
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        rate_limit_burst: 1,
        ..ApiConfig::default()
    };
    let app = app_with(config);

    let from = |ip: &str| {
        Request::builder()
            .uri("/api/sources")
            .header("X-Forwarded-For", ip)
            .body(Body::empty())
            .unwrap()
    };

    let (first, _) = send(&app.router, from("203.0.113.9")).await;
    assert_eq!(first, StatusCode::OK);
    let (second, body) = send(&app.router, from("203.0.113.9")).await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "rate_limited");

    let (other, _) = send(&app.router, from("203.0.113.10")).await;
    assert_eq!(other, StatusCode::OK);

    // Health probes bypass the limiter
    let (health, _) = send(&app.router, get("/health")).await;
    assert_eq!(health, StatusCode::OK);
}
