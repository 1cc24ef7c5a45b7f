//! Collaborator interfaces consumed by the pipeline stages.

use async_trait::async_trait;

use tforge_models::Classification;

use crate::error::ClientResult;

/// Prompt sent to a chat-completion model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 400,
            temperature: 0.7,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Text generation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> ClientResult<String>;
}

/// Prompt-to-image generation. Returns encoded image bytes.
#[async_trait]
pub trait ImageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> ClientResult<Vec<u8>>;
}

/// Text-to-speech. Returns encoded audio bytes.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str) -> ClientResult<Vec<u8>>;
}

/// Single-label text classification; returns the top verdict.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> ClientResult<Classification>;
}

/// Search-interest values for a term over the recent window.
#[async_trait]
pub trait InterestFeed: Send + Sync {
    async fn interest(&self, term: &str, credential: Option<&str>) -> ClientResult<Vec<f64>>;
}

/// Titles of currently popular videos.
#[async_trait]
pub trait PopularVideoFeed: Send + Sync {
    async fn popular_titles(&self, credential: Option<&str>) -> ClientResult<Vec<String>>;
}

/// Recent posts matching a query.
///
/// `credential` overrides the configured key when the caller has a
/// per-source one.
#[async_trait]
pub trait PostSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, credential: Option<&str>) -> ClientResult<Vec<String>>;
}
