//! Stage-agents: one unit of work per pipeline step.

use std::fmt;

use async_trait::async_trait;

use crate::error::StageResult;

mod image;
mod interaction;
mod metadata;
mod narration;
mod script;
mod sentiment;
mod topic;
mod trends;
mod video;

pub use image::{pick_style, ClassifierStyleRanker, ImageAgent, ImageInput, ImageSet, StyleRanker};
pub use interaction::{interaction_prompt, InteractionAgent};
pub use metadata::{MetadataAgent, MetadataInput, MetadataOutput};
pub use narration::{NarrationAgent, NarrationInput};
pub use script::{script_prompt, tone_for, ScriptAgent, ScriptInput};
pub use sentiment::SentimentAgent;
pub use topic::TopicAgent;
pub use trends::TrendAgent;
pub use video::{VideoAgent, VideoInput};

/// The nine pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Trends,
    Topic,
    Sentiment,
    Script,
    Images,
    Narration,
    Video,
    Interaction,
    Metadata,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Trends,
        Stage::Topic,
        Stage::Sentiment,
        Stage::Script,
        Stage::Images,
        Stage::Narration,
        Stage::Video,
        Stage::Interaction,
        Stage::Metadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Trends => "trend_collection",
            Stage::Topic => "topic_selection",
            Stage::Sentiment => "sentiment_analysis",
            Stage::Script => "script_generation",
            Stage::Images => "image_generation",
            Stage::Narration => "narration_synthesis",
            Stage::Video => "video_assembly",
            Stage::Interaction => "interaction_generation",
            Stage::Metadata => "metadata_preparation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pipeline step. Consumes the outputs of earlier steps, produces a new
/// immutable value.
#[async_trait]
pub trait StageAgent: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    fn stage(&self) -> Stage;

    async fn run(&self, input: Self::Input) -> StageResult<Self::Output>;
}

/// Type-erased agent for a given input/output pair.
pub type BoxedAgent<I, O> = Box<dyn StageAgent<Input = I, Output = O>>;
