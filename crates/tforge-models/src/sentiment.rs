//! Sentiment labels and aggregation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One classifier verdict for a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    pub label: String,
    pub score: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.label.eq_ignore_ascii_case("positive")
    }

    /// `+score` for positive verdicts, `-score` for everything else.
    pub fn polarity(&self) -> f64 {
        if self.is_positive() {
            self.score
        } else {
            -self.score
        }
    }
}

/// Overall mood around a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    /// Average the per-post polarities. No posts reads as neutral.
    pub fn from_scores(scores: &[Classification]) -> Self {
        if scores.is_empty() {
            return Sentiment::Neutral;
        }
        let total: f64 = scores.iter().map(Classification::polarity).sum();
        let average = total / scores.len() as f64;

        if average > 0.0 {
            Sentiment::Positive
        } else if average < 0.0 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Sentiment::Positive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_average() {
        let scores = [
            Classification::new("POSITIVE", 0.9),
            Classification::new("NEGATIVE", 0.3),
        ];
        assert_eq!(Sentiment::from_scores(&scores), Sentiment::Positive);
    }

    #[test]
    fn test_balanced_scores_are_neutral() {
        let scores = [
            Classification::new("POSITIVE", 0.5),
            Classification::new("NEGATIVE", 0.5),
        ];
        assert_eq!(Sentiment::from_scores(&scores), Sentiment::Neutral);
    }

    #[test]
    fn test_empty_is_neutral() {
        assert_eq!(Sentiment::from_scores(&[]), Sentiment::Neutral);
    }

    #[test]
    fn test_non_positive_labels_count_against() {
        let scores = [
            Classification::new("NEUTRAL", 0.8),
            Classification::new("positive", 0.2),
        ];
        assert_eq!(Sentiment::from_scores(&scores), Sentiment::Negative);
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(serde_json::to_string(&Sentiment::Negative).unwrap(), "\"negative\"");
    }
}
