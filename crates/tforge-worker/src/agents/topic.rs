use async_trait::async_trait;

use tforge_models::TrendBundle;

use super::{Stage, StageAgent};
use crate::error::StageResult;

/// Picks one topic: first popular video, else first post, else the niche.
#[derive(Debug, Default)]
pub struct TopicAgent;

#[async_trait]
impl StageAgent for TopicAgent {
    type Input = TrendBundle;
    type Output = String;

    fn stage(&self) -> Stage {
        Stage::Topic
    }

    async fn run(&self, trends: TrendBundle) -> StageResult<String> {
        Ok(trends.select_topic())
    }
}
