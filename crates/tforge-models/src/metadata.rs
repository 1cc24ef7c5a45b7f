//! Upload metadata persisted next to the video.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::InteractionBundle;

/// Number of script characters kept in the description.
pub const DESCRIPTION_CHARS: usize = 200;

/// Title, description and tags for the video upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Serialized as `{}` when interaction was disabled
    #[serde(
        default,
        serialize_with = "serialize_interaction",
        deserialize_with = "deserialize_interaction"
    )]
    pub interaction: Option<InteractionBundle>,
}

impl UploadMetadata {
    pub fn build(topic: &str, script: &str, interaction: Option<InteractionBundle>) -> Self {
        Self {
            title: format!("Exploring {}", topic),
            description: describe(script),
            tags: vec![topic.to_string(), "YouTube".to_string(), "trending".to_string()],
            interaction,
        }
    }
}

/// First [`DESCRIPTION_CHARS`] characters of the script plus an ellipsis.
pub fn describe(script: &str) -> String {
    let mut description: String = script.chars().take(DESCRIPTION_CHARS).collect();
    description.push_str("...");
    description
}

fn serialize_interaction<S>(value: &Option<InteractionBundle>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(bundle) => bundle.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}

fn deserialize_interaction<'de, D>(deserializer: D) -> Result<Option<InteractionBundle>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
