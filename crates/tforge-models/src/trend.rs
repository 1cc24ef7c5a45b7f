//! Trend collection output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Signals gathered for a niche from every configured trend source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendBundle {
    pub niche: String,
    /// Search-interest values over the recent window
    #[serde(default)]
    pub google: Vec<f64>,
    /// Currently popular video titles
    #[serde(default)]
    pub youtube: Vec<String>,
    /// Recent posts mentioning the niche
    #[serde(default)]
    pub x: Vec<String>,
    /// Lines contributed by sources without a dedicated integration
    #[serde(default)]
    pub other: Vec<String>,
}

impl TrendBundle {
    pub fn new(niche: impl Into<String>) -> Self {
        Self {
            niche: niche.into(),
            ..Default::default()
        }
    }

    /// Pick the topic: first popular video, then first post, then the niche itself.
    pub fn select_topic(&self) -> String {
        self.youtube
            .first()
            .or_else(|| self.x.first())
            .cloned()
            .unwrap_or_else(|| self.niche.clone())
    }
}
