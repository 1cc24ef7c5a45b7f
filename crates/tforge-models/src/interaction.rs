//! Poll and call-to-action extracted from model output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const POLL_MARKER: &str = "Poll: ";
const OPTIONS_MARKER: &str = "Options: ";
const CTA_MARKER: &str = "CTA: ";

/// Failure to extract an [`InteractionBundle`] from free text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing marker {0:?} in model output")]
    MissingMarker(&'static str),

    #[error("section after {0:?} is empty")]
    EmptySection(&'static str),
}

/// Interactive elements attached to the upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InteractionBundle {
    pub poll: String,
    pub options: Vec<String>,
    pub cta: String,
}

impl InteractionBundle {
    /// Extract the bundle from text shaped like:
    ///
    /// ```text
    /// Poll: Would you fly to Mars?
    /// Options: Yes, No, Maybe
    /// CTA: Subscribe for more launches!
    /// ```
    ///
    /// `Poll` and `Options` run to the end of their line; `CTA` takes the rest.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let poll = line_after(text, POLL_MARKER)?;
        let options_line = line_after(text, OPTIONS_MARKER)?;
        let cta = rest_after(text, CTA_MARKER)?.trim().to_string();

        if poll.is_empty() {
            return Err(ParseError::EmptySection(POLL_MARKER));
        }
        if cta.is_empty() {
            return Err(ParseError::EmptySection(CTA_MARKER));
        }

        let options: Vec<String> = options_line
            .split(", ")
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if options.is_empty() {
            return Err(ParseError::EmptySection(OPTIONS_MARKER));
        }

        Ok(Self {
            poll: poll.to_string(),
            options,
            cta,
        })
    }
}

fn rest_after<'a>(text: &'a str, marker: &'static str) -> Result<&'a str, ParseError> {
    text.split_once(marker)
        .map(|(_, rest)| rest)
        .ok_or(ParseError::MissingMarker(marker))
}

fn line_after<'a>(text: &'a str, marker: &'static str) -> Result<&'a str, ParseError> {
    let rest = rest_after(text, marker)?;
    Ok(rest.lines().next().unwrap_or_default().trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interaction() {
        let text = "Poll: Would you buy a ticket to orbit?\nOptions: Yes, No, Only if it's cheap\nCTA: Subscribe and hit the bell!\n";
        let bundle = InteractionBundle::parse(text).unwrap();
        assert_eq!(bundle.poll, "Would you buy a ticket to orbit?");
        assert_eq!(bundle.options, vec!["Yes", "No", "Only if it's cheap"]);
        assert_eq!(bundle.cta, "Subscribe and hit the bell!");
    }

    #[test]
    fn test_parse_tolerates_preamble_and_crlf() {
        let text = "Sure! Here it is.\r\nPoll: Best rover?\r\nOptions: Curiosity, Perseverance\r\nCTA:  Comment below. \r\n";
        let bundle = InteractionBundle::parse(text).unwrap();
        assert_eq!(bundle.poll, "Best rover?");
        assert_eq!(bundle.options, vec!["Curiosity", "Perseverance"]);
        assert_eq!(bundle.cta, "Comment below.");
    }

    #[test]
    fn test_missing_marker_is_an_error() {
        let text = "Poll: Best rover?\nCTA: Comment below.";
        assert_eq!(
            InteractionBundle::parse(text),
            Err(ParseError::MissingMarker("Options: "))
        );
        assert_eq!(
            InteractionBundle::parse("no structure at all"),
            Err(ParseError::MissingMarker("Poll: "))
        );
    }

    #[test]
    fn test_empty_poll_is_an_error() {
        let text = "Poll: \nOptions: A, B\nCTA: Go";
        assert_eq!(
            InteractionBundle::parse(text),
            Err(ParseError::EmptySection("Poll: "))
        );
    }
}
