use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use tforge_clients::{ClientResult, ImageModel, TextClassifier};
use tforge_models::{ArtifactKind, MediaArtifact, StyleChoice, STYLE_CANDIDATES};

use super::{Stage, StageAgent};
use crate::artifacts::ArtifactArea;
use crate::error::StageResult;

/// Scores how well a visual style suits a topic. Higher is better.
#[async_trait]
pub trait StyleRanker: Send + Sync {
    async fn score(&self, topic: &str, style: &str) -> ClientResult<f64>;
}

/// Ranks styles by the classifier's confidence in `"{topic} {style}"`.
pub struct ClassifierStyleRanker {
    classifier: Arc<dyn TextClassifier>,
}

impl ClassifierStyleRanker {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl StyleRanker for ClassifierStyleRanker {
    async fn score(&self, topic: &str, style: &str) -> ClientResult<f64> {
        let verdict = self.classifier.classify(&format!("{} {}", topic, style)).await?;
        Ok(verdict.score)
    }
}

/// Highest-scoring candidate; ties go to the earliest one.
pub async fn pick_style(ranker: &dyn StyleRanker, topic: &str, candidates: &[&str]) -> StageResult<String> {
    let mut best: Option<(&str, f64)> = None;
    for candidate in candidates {
        let score = ranker.score(topic, candidate).await?;
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((*candidate, score));
        }
    }
    Ok(best.map(|(style, _)| style).unwrap_or(STYLE_CANDIDATES[0]).to_string())
}

pub struct ImageInput {
    pub topic: String,
    pub style: StyleChoice,
}

/// Both images plus the style they were drawn in.
#[derive(Debug, Clone)]
pub struct ImageSet {
    pub thumbnail: MediaArtifact,
    pub background: MediaArtifact,
    pub style: String,
}

/// Produces the thumbnail and the background still.
pub struct ImageAgent {
    thumbnails: Arc<dyn ImageModel>,
    backgrounds: Arc<dyn ImageModel>,
    ranker: Arc<dyn StyleRanker>,
    artifacts: Arc<ArtifactArea>,
}

impl ImageAgent {
    pub fn new(
        thumbnails: Arc<dyn ImageModel>,
        backgrounds: Arc<dyn ImageModel>,
        ranker: Arc<dyn StyleRanker>,
        artifacts: Arc<ArtifactArea>,
    ) -> Self {
        Self {
            thumbnails,
            backgrounds,
            ranker,
            artifacts,
        }
    }
}

#[async_trait]
impl StageAgent for ImageAgent {
    type Input = ImageInput;
    type Output = ImageSet;

    fn stage(&self) -> Stage {
        Stage::Images
    }

    async fn run(&self, input: ImageInput) -> StageResult<ImageSet> {
        let style = match input.style.explicit() {
            Some(style) => style.to_string(),
            None => {
                let style = pick_style(self.ranker.as_ref(), &input.topic, &STYLE_CANDIDATES).await?;
                info!("Recommended style for {}: {}", input.topic, style);
                style
            }
        };

        let prompt = format!("A {} style image related to {}", style, input.topic);

        let thumbnail = self
            .artifacts
            .write(ArtifactKind::Thumbnail, &self.thumbnails.generate(&prompt).await?)
            .await?;
        let background = self
            .artifacts
            .write(ArtifactKind::Background, &self.backgrounds.generate(&prompt).await?)
            .await?;

        Ok(ImageSet {
            thumbnail,
            background,
            style,
        })
    }
}
