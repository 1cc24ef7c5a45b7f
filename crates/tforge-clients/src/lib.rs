//! HTTP clients for the services behind each pipeline stage.
//!
//! This crate provides:
//! - Collaborator traits (chat, image, speech, classification, feeds)
//! - OpenAI-compatible and Hugging Face implementations
//! - Trend and post feeds (SerpApi, YouTube Data API, X, Reddit)
//! - Shared retry/backoff and credential handling

pub mod error;
pub mod feeds;
pub mod http;
pub mod huggingface;
pub mod openai;
pub mod traits;

pub use error::{ClientError, ClientResult};
pub use feeds::{
    RedditSearch, SerpApiTrends, XRecentSearch, YoutubeCharts, SERPAPI_KEY_VAR, X_KEY_VAR,
    YOUTUBE_KEY_VAR,
};
pub use http::{with_retry, HttpClientConfig};
pub use huggingface::{HfClassifier, HfTextToImage};
pub use openai::{OpenAiChat, OpenAiImages, OpenAiSpeech};
pub use traits::{
    ChatModel, ChatRequest, ImageModel, InterestFeed, PopularVideoFeed, PostSearch, SpeechModel,
    TextClassifier,
};
