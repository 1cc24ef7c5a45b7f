use std::sync::Arc;

use async_trait::async_trait;

use tforge_clients::SpeechModel;
use tforge_models::{ArtifactKind, MediaArtifact};

use super::{Stage, StageAgent};
use crate::artifacts::ArtifactArea;
use crate::error::StageResult;

pub struct NarrationInput {
    pub script: String,
    pub language: String,
}

/// Speaks the script into an mp3 voiceover.
pub struct NarrationAgent {
    speech: Arc<dyn SpeechModel>,
    artifacts: Arc<ArtifactArea>,
}

impl NarrationAgent {
    pub fn new(speech: Arc<dyn SpeechModel>, artifacts: Arc<ArtifactArea>) -> Self {
        Self { speech, artifacts }
    }
}

#[async_trait]
impl StageAgent for NarrationAgent {
    type Input = NarrationInput;
    type Output = MediaArtifact;

    fn stage(&self) -> Stage {
        Stage::Narration
    }

    async fn run(&self, input: NarrationInput) -> StageResult<MediaArtifact> {
        let audio = self.speech.synthesize(&input.script, &input.language).await?;
        Ok(self.artifacts.write(ArtifactKind::Audio, &audio).await?)
    }
}
