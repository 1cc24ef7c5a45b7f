//! Shared data models for the TubeForge pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Job requests, handles and status records
//! - Per-stage pipeline outputs (trends, sentiment, style, artifacts)
//! - Interaction and upload metadata
//! - Trend source configuration rows
//! - WebSocket message schemas

pub mod artifact;
pub mod interaction;
pub mod job;
pub mod metadata;
pub mod result;
pub mod sentiment;
pub mod source;
pub mod style;
pub mod trend;
pub mod ws;

// Re-export common types
pub use artifact::{ArtifactKind, MediaArtifact};
pub use interaction::{InteractionBundle, ParseError};
pub use job::{JobId, JobRequest, JobState, JobStatusRecord};
pub use metadata::UploadMetadata;
pub use result::RunResult;
pub use sentiment::{Classification, Sentiment};
pub use source::{TrendSource, GOOGLE_TRENDS, X_TRENDS, YOUTUBE_TRENDS};
pub use style::{StyleChoice, STYLE_CANDIDATES};
pub use trend::TrendBundle;
pub use ws::WsMessage;
