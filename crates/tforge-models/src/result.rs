//! Aggregate result of a pipeline run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{InteractionBundle, MediaArtifact, Sentiment, TrendBundle, UploadMetadata};

/// Every stage output of one job, keyed by stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunResult {
    pub niche: String,
    pub trends: TrendBundle,
    pub topic: String,
    pub sentiment: Sentiment,
    pub script: String,
    /// Style actually used for the images (never `auto`)
    pub style: String,
    pub thumbnail: MediaArtifact,
    pub background: MediaArtifact,
    pub audio: MediaArtifact,
    pub video: MediaArtifact,
    /// `None` iff interaction was disabled for the job
    pub interaction: Option<InteractionBundle>,
    pub upload: UploadMetadata,
    /// The persisted copy of `upload`
    pub metadata: MediaArtifact,
}
