//! Visual style selection.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candidate styles considered when the request asks for `auto`.
pub const STYLE_CANDIDATES: [&str; 4] = ["cyberpunk", "retro", "minimalist", "futuristic"];

/// Requested image style. Serialized as a plain string, `"auto"` for [`StyleChoice::Auto`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StyleChoice {
    /// Let the image stage rank the candidates for the topic
    #[default]
    Auto,
    /// Use this style verbatim
    Explicit(String),
}

impl StyleChoice {
    pub fn is_auto(&self) -> bool {
        matches!(self, StyleChoice::Auto)
    }

    /// The explicit style, if one was requested.
    pub fn explicit(&self) -> Option<&str> {
        match self {
            StyleChoice::Auto => None,
            StyleChoice::Explicit(s) => Some(s),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StyleChoice::Auto => "auto",
            StyleChoice::Explicit(s) => s,
        }
    }
}

impl From<String> for StyleChoice {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            StyleChoice::Auto
        } else {
            StyleChoice::Explicit(trimmed.to_string())
        }
    }
}

impl From<&str> for StyleChoice {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<StyleChoice> for String {
    fn from(value: StyleChoice) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for StyleChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JsonSchema for StyleChoice {
    fn schema_name() -> String {
        "StyleChoice".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style() {
        assert_eq!(StyleChoice::from("auto"), StyleChoice::Auto);
        assert_eq!(StyleChoice::from(" AUTO "), StyleChoice::Auto);
        assert_eq!(StyleChoice::from(""), StyleChoice::Auto);
        assert_eq!(
            StyleChoice::from("retro"),
            StyleChoice::Explicit("retro".to_string())
        );
    }

    #[test]
    fn test_style_serializes_as_string() {
        let json = serde_json::to_string(&StyleChoice::Explicit("minimalist".into())).unwrap();
        assert_eq!(json, "\"minimalist\"");
        let auto: StyleChoice = serde_json::from_str("\"auto\"").unwrap();
        assert!(auto.is_auto());
        assert_eq!(auto.explicit(), None);
    }
}
