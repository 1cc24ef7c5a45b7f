use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use tforge_clients::{PostSearch, TextClassifier};
use tforge_models::Sentiment;

use super::{Stage, StageAgent};
use crate::error::StageResult;

/// Scores public posts about the topic and averages their polarity.
pub struct SentimentAgent {
    classifier: Arc<dyn TextClassifier>,
    posts: Vec<Arc<dyn PostSearch>>,
}

impl SentimentAgent {
    pub fn new(classifier: Arc<dyn TextClassifier>, posts: Vec<Arc<dyn PostSearch>>) -> Self {
        Self { classifier, posts }
    }
}

#[async_trait]
impl StageAgent for SentimentAgent {
    type Input = String;
    type Output = Sentiment;

    fn stage(&self) -> Stage {
        Stage::Sentiment
    }

    async fn run(&self, topic: String) -> StageResult<Sentiment> {
        let mut texts = Vec::new();
        for source in &self.posts {
            let found = source.search(&topic, None).await?;
            debug!(source = source.name(), count = found.len(), "Collected posts");
            texts.extend(found);
        }

        if texts.is_empty() {
            warn!("No posts found for sentiment analysis");
            return Ok(Sentiment::Neutral);
        }

        let mut scores = Vec::with_capacity(texts.len());
        for text in &texts {
            scores.push(self.classifier.classify(text).await?);
        }

        Ok(Sentiment::from_scores(&scores))
    }
}
