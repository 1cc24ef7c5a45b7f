use std::sync::Arc;

use async_trait::async_trait;

use tforge_clients::{ChatModel, ChatRequest};
use tforge_models::InteractionBundle;

use super::{Stage, StageAgent};
use crate::error::StageResult;

pub fn interaction_prompt(topic: &str) -> String {
    format!("Generate a YouTube poll and CTA for a video about '{}'.", topic)
}

/// Asks the chat model for a poll and call to action, then parses them out.
pub struct InteractionAgent {
    chat: Arc<dyn ChatModel>,
}

impl InteractionAgent {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl StageAgent for InteractionAgent {
    type Input = String;
    type Output = InteractionBundle;

    fn stage(&self) -> Stage {
        Stage::Interaction
    }

    async fn run(&self, topic: String) -> StageResult<InteractionBundle> {
        let request = ChatRequest::new(interaction_prompt(&topic)).max_tokens(150);
        let text = self.chat.complete(&request).await?;
        Ok(InteractionBundle::parse(&text)?)
    }
}
