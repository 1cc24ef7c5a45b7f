//! Worker and agent configuration.

use std::time::Duration;

use tforge_clients::feeds::{REDDIT_BASE_URL, SERPAPI_BASE_URL, X_API_BASE_URL, YOUTUBE_API_BASE_URL};
use tforge_clients::huggingface::{DEFAULT_IMAGE_MODEL, DEFAULT_SENTIMENT_MODEL, HF_INFERENCE_BASE_URL};
use tforge_clients::openai::OPENAI_BASE_URL;
use tforge_clients::HttpClientConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Per-stage timeout; `None` lets stages run as long as they need
    pub stage_timeout: Option<Duration>,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Root of the artifact area
    pub content_dir: String,
    /// How often the worker should scan for orphaned pending jobs
    pub claim_interval: Duration,
    /// Port for the Prometheus scrape endpoint, if any
    pub metrics_port: Option<u16>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            stage_timeout: None,
            shutdown_timeout: Duration::from_secs(60),
            content_dir: "assets".to_string(),
            claim_interval: Duration::from_secs(30),
            metrics_port: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(2),
            stage_timeout: std::env::var("WORKER_STAGE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            content_dir: std::env::var("CONTENT_DIR").unwrap_or_else(|_| "assets".to_string()),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            metrics_port: std::env::var("WORKER_METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

/// Endpoints, credentials and model names for the stage collaborators.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub openai: HttpClientConfig,
    pub huggingface: HttpClientConfig,
    pub serpapi: HttpClientConfig,
    pub youtube: HttpClientConfig,
    pub x: HttpClientConfig,
    pub reddit: HttpClientConfig,
    pub chat_model: String,
    pub image_model: String,
    pub image_size: String,
    pub speech_model: String,
    pub speech_voice: String,
    pub sentiment_model: String,
    pub style_model: String,
    pub background_model: String,
    /// Kill FFmpeg after this many seconds
    pub ffmpeg_timeout_secs: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            openai: HttpClientConfig::new(OPENAI_BASE_URL),
            huggingface: HttpClientConfig::new(HF_INFERENCE_BASE_URL),
            serpapi: HttpClientConfig::new(SERPAPI_BASE_URL),
            youtube: HttpClientConfig::new(YOUTUBE_API_BASE_URL),
            x: HttpClientConfig::new(X_API_BASE_URL),
            reddit: HttpClientConfig::new(REDDIT_BASE_URL),
            chat_model: "gpt-4".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            speech_model: "tts-1".to_string(),
            speech_voice: "alloy".to_string(),
            sentiment_model: DEFAULT_SENTIMENT_MODEL.to_string(),
            style_model: "distilbert-base-uncased".to_string(),
            background_model: DEFAULT_IMAGE_MODEL.to_string(),
            ffmpeg_timeout_secs: Some(600),
        }
    }
}

impl AgentConfig {
    /// Create config from environment variables.
    ///
    /// Each service reads `{PREFIX}_API_KEY`, `{PREFIX}_BASE_URL`,
    /// `{PREFIX}_TIMEOUT_SECS` and `{PREFIX}_MAX_RETRIES` with prefixes
    /// `OPENAI`, `HF`, `SERPAPI`, `YOUTUBE`, `X` and `REDDIT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str, default: String| std::env::var(name).unwrap_or(default);

        Self {
            openai: HttpClientConfig::from_env("OPENAI", OPENAI_BASE_URL),
            huggingface: HttpClientConfig::from_env("HF", HF_INFERENCE_BASE_URL),
            serpapi: HttpClientConfig::from_env("SERPAPI", SERPAPI_BASE_URL),
            youtube: HttpClientConfig::from_env("YOUTUBE", YOUTUBE_API_BASE_URL),
            x: HttpClientConfig::from_env("X", X_API_BASE_URL),
            reddit: HttpClientConfig::from_env("REDDIT", REDDIT_BASE_URL),
            chat_model: var("OPENAI_CHAT_MODEL", defaults.chat_model),
            image_model: var("OPENAI_IMAGE_MODEL", defaults.image_model),
            image_size: var("OPENAI_IMAGE_SIZE", defaults.image_size),
            speech_model: var("OPENAI_SPEECH_MODEL", defaults.speech_model),
            speech_voice: var("OPENAI_SPEECH_VOICE", defaults.speech_voice),
            sentiment_model: var("HF_SENTIMENT_MODEL", defaults.sentiment_model),
            style_model: var("HF_STYLE_MODEL", defaults.style_model),
            background_model: var("HF_IMAGE_MODEL", defaults.background_model),
            ffmpeg_timeout_secs: std::env::var("FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(defaults.ffmpeg_timeout_secs),
        }
    }
}
