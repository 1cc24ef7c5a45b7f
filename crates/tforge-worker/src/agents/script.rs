use std::sync::Arc;

use async_trait::async_trait;

use tforge_clients::{ChatModel, ChatRequest};
use tforge_models::Sentiment;

use super::{Stage, StageAgent};
use crate::error::{StageError, StageResult};

pub struct ScriptInput {
    pub topic: String,
    pub sentiment: Sentiment,
}

pub fn tone_for(sentiment: Sentiment) -> &'static str {
    if sentiment.is_positive() {
        "upbeat and engaging"
    } else {
        "informative and balanced"
    }
}

pub fn script_prompt(topic: &str, sentiment: Sentiment) -> String {
    format!(
        "Write a 100-200 word YouTube script about '{}' with a {} tone.",
        topic,
        tone_for(sentiment)
    )
}

/// Writes the narration script.
pub struct ScriptAgent {
    chat: Arc<dyn ChatModel>,
}

impl ScriptAgent {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl StageAgent for ScriptAgent {
    type Input = ScriptInput;
    type Output = String;

    fn stage(&self) -> Stage {
        Stage::Script
    }

    async fn run(&self, input: ScriptInput) -> StageResult<String> {
        let request = ChatRequest::new(script_prompt(&input.topic, input.sentiment))
            .max_tokens(400)
            .temperature(0.7);
        let script = self.chat.complete(&request).await?;

        if script.trim().is_empty() {
            return Err(StageError::malformed("empty script"));
        }
        Ok(script)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_follows_sentiment() {
        assert_eq!(tone_for(Sentiment::Positive), "upbeat and engaging");
        assert_eq!(tone_for(Sentiment::Neutral), "informative and balanced");
        assert_eq!(tone_for(Sentiment::Negative), "informative and balanced");
    }

    #[test]
    fn test_prompt() {
        assert_eq!(
            script_prompt("Mars", Sentiment::Positive),
            "Write a 100-200 word YouTube script about 'Mars' with a upbeat and engaging tone."
        );
    }
}
