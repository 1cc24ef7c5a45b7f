use std::sync::Arc;

use async_trait::async_trait;

use tforge_models::{ArtifactKind, InteractionBundle, MediaArtifact, UploadMetadata};

use super::{Stage, StageAgent};
use crate::artifacts::ArtifactArea;
use crate::error::StageResult;

pub struct MetadataInput {
    pub topic: String,
    pub script: String,
    pub interaction: Option<InteractionBundle>,
}

pub struct MetadataOutput {
    pub upload: UploadMetadata,
    pub artifact: MediaArtifact,
}

/// Builds the upload metadata and saves it as JSON.
pub struct MetadataAgent {
    artifacts: Arc<ArtifactArea>,
}

impl MetadataAgent {
    pub fn new(artifacts: Arc<ArtifactArea>) -> Self {
        Self { artifacts }
    }
}

#[async_trait]
impl StageAgent for MetadataAgent {
    type Input = MetadataInput;
    type Output = MetadataOutput;

    fn stage(&self) -> Stage {
        Stage::Metadata
    }

    async fn run(&self, input: MetadataInput) -> StageResult<MetadataOutput> {
        let upload = UploadMetadata::build(&input.topic, &input.script, input.interaction);
        let json = serde_json::to_vec(&upload)?;
        let artifact = self.artifacts.write(ArtifactKind::Metadata, &json).await?;
        Ok(MetadataOutput { upload, artifact })
    }
}
