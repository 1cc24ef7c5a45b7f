//! Trend source configuration rows.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Source name for the search-interest provider.
pub const GOOGLE_TRENDS: &str = "Google Trends";
/// Source name for the popular-videos provider.
pub const YOUTUBE_TRENDS: &str = "YouTube Trends";
/// Source name for the recent-posts provider.
pub const X_TRENDS: &str = "X Trends";

/// A configured upstream provider the trend stage may query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrendSource {
    /// Unique key; also selects the integration used
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(url)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl TrendSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    /// Rows written at startup.
    pub fn defaults(youtube_api_key: Option<String>) -> Vec<TrendSource> {
        vec![
            TrendSource::new(GOOGLE_TRENDS, "https://trends.google.com"),
            TrendSource::new(YOUTUBE_TRENDS, "https://www.youtube.com").with_api_key(youtube_api_key),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = TrendSource::defaults(Some("yt-key".to_string()));
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults[0].name, GOOGLE_TRENDS);
        assert_eq!(defaults[0].api_key, None);
        assert_eq!(defaults[1].name, YOUTUBE_TRENDS);
        assert_eq!(defaults[1].api_key.as_deref(), Some("yt-key"));
    }

    #[test]
    fn test_empty_api_key_is_dropped() {
        let source = TrendSource::new(X_TRENDS, "https://x.com").with_api_key(Some(String::new()));
        assert!(source.api_key.is_none());
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        assert!(TrendSource::new("Custom", "not a url").validate().is_err());
        assert!(TrendSource::new("Custom", "https://example.com").validate().is_ok());
    }
}
