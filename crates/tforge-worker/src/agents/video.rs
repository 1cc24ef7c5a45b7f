use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use tforge_media::{CompositionRequest, Pacing, VideoCompositor};
use tforge_models::{ArtifactKind, MediaArtifact, Sentiment};

use super::{Stage, StageAgent};
use crate::artifacts::ArtifactArea;
use crate::error::StageResult;

pub struct VideoInput {
    pub thumbnail: MediaArtifact,
    pub background: MediaArtifact,
    pub audio: MediaArtifact,
    pub script: String,
    pub sentiment: Sentiment,
}

/// Thumbnail intro, then the background under the narration.
pub struct VideoAgent {
    compositor: Arc<dyn VideoCompositor>,
    artifacts: Arc<ArtifactArea>,
}

impl VideoAgent {
    pub fn new(compositor: Arc<dyn VideoCompositor>, artifacts: Arc<ArtifactArea>) -> Self {
        Self { compositor, artifacts }
    }
}

#[async_trait]
impl StageAgent for VideoAgent {
    type Input = VideoInput;
    type Output = MediaArtifact;

    fn stage(&self) -> Stage {
        Stage::Video
    }

    async fn run(&self, input: VideoInput) -> StageResult<MediaArtifact> {
        let output = self.artifacts.allocate(ArtifactKind::Video);
        let pacing = Pacing::for_sentiment(input.sentiment);
        debug!(
            intro_secs = pacing.intro_secs,
            main_secs = pacing.main_secs,
            script_chars = input.script.chars().count(),
            "Editing video with dynamic pacing"
        );

        let request = CompositionRequest {
            thumbnail: input.thumbnail.path,
            background: input.background.path,
            audio: input.audio.path,
            output: output.path.clone(),
            pacing,
        };
        self.compositor.compose(&request).await?;

        Ok(output)
    }
}
