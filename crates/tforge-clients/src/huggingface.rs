//! Hugging Face Inference API: text classification and text-to-image.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tforge_models::Classification;

use crate::error::{ClientError, ClientResult};
use crate::http::{HttpClient, HttpClientConfig};
use crate::traits::{ImageModel, TextClassifier};

pub const HF_INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_SENTIMENT_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";
pub const DEFAULT_IMAGE_MODEL: &str = "stabilityai/stable-diffusion-xl-base-1.0";

#[derive(Serialize)]
struct InferenceBody<'a> {
    inputs: &'a str,
}

/// Classification output comes back either flat or nested one level per input.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<Classification>>),
    Flat(Vec<Classification>),
}

impl ClassificationResponse {
    fn top(self) -> Option<Classification> {
        let labels = match self {
            ClassificationResponse::Nested(outer) => outer.into_iter().next().unwrap_or_default(),
            ClassificationResponse::Flat(labels) => labels,
        };
        labels
            .into_iter()
            .fold(None, |best: Option<Classification>, c| match best {
                Some(b) if b.score >= c.score => Some(b),
                _ => Some(c),
            })
    }
}

/// Hosted text-classification model.
pub struct HfClassifier {
    client: HttpClient,
    model: String,
}

impl HfClassifier {
    pub fn new(config: HttpClientConfig, model: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            client: HttpClient::with_required_key(config, "HF_API_KEY")?,
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextClassifier for HfClassifier {
    async fn classify(&self, text: &str) -> ClientResult<Classification> {
        let url = self.client.url(&format!("models/{}", self.model));
        let key = self.client.resolve_key(None, "HF_API_KEY")?;
        let body = InferenceBody { inputs: text };

        let response = self
            .client
            .send(|http| http.post(&url).bearer_auth(key).json(&body))
            .await?;
        let parsed: ClassificationResponse = response.json().await?;

        let top = parsed
            .top()
            .ok_or_else(|| ClientError::invalid_response("classifier returned no labels"))?;
        debug!(label = %top.label, score = top.score, "Classified text");
        Ok(top)
    }
}

/// Hosted diffusion model returning raw image bytes.
pub struct HfTextToImage {
    client: HttpClient,
    model: String,
}

impl HfTextToImage {
    pub fn new(config: HttpClientConfig, model: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            client: HttpClient::with_required_key(config, "HF_API_KEY")?,
            model: model.into(),
        })
    }
}

#[async_trait]
impl ImageModel for HfTextToImage {
    async fn generate(&self, prompt: &str) -> ClientResult<Vec<u8>> {
        let url = self.client.url(&format!("models/{}", self.model));
        let key = self.client.resolve_key(None, "HF_API_KEY")?;
        let body = InferenceBody { inputs: prompt };

        let response = self
            .client
            .send(|http| {
                http.post(&url)
                    .bearer_auth(key)
                    .header("Accept", "image/png")
                    .json(&body)
            })
            .await?;

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        let bytes = response.bytes().await?;
        if is_json || bytes.is_empty() {
            return Err(ClientError::invalid_response(format!(
                "expected image bytes, got: {}",
                String::from_utf8_lossy(&bytes)
            )));
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_response_picks_top_label() {
        let parsed: ClassificationResponse = serde_json::from_str(
            r#"[[{"label":"NEGATIVE","score":0.1},{"label":"POSITIVE","score":0.9}]]"#,
        )
        .unwrap();
        let top = parsed.top().unwrap();
        assert_eq!(top.label, "POSITIVE");
    }

    #[test]
    fn test_flat_response() {
        let parsed: ClassificationResponse =
            serde_json::from_str(r#"[{"label":"NEGATIVE","score":0.7}]"#).unwrap();
        assert_eq!(parsed.top().unwrap().score, 0.7);
    }

    #[test]
    fn test_empty_response_has_no_top() {
        let parsed: ClassificationResponse = serde_json::from_str("[]").unwrap();
        assert!(parsed.top().is_none());
    }
}
