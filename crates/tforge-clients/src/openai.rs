//! OpenAI-compatible chat, image and speech endpoints.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::http::{HttpClient, HttpClientConfig};
use crate::traits::{ChatModel, ChatRequest, ImageModel, SpeechModel};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions (`/chat/completions`).
pub struct OpenAiChat {
    client: HttpClient,
    model: String,
}

impl OpenAiChat {
    pub fn new(config: HttpClientConfig, model: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            client: HttpClient::with_required_key(config, "OPENAI_API_KEY")?,
            model: model.into(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, request: &ChatRequest) -> ClientResult<String> {
        let url = self.client.url("chat/completions");
        let key = self.client.resolve_key(None, "OPENAI_API_KEY")?;
        let body = ChatCompletionBody {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!("Requesting chat completion from {} ({})", url, self.model);
        let response = self
            .client
            .send(|http| http.post(&url).bearer_auth(key).json(&body))
            .await?;
        let parsed: ChatCompletionResponse = response.json().await?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(ClientError::invalid_response("chat completion returned no content"));
        }
        Ok(content)
    }
}

#[derive(Serialize)]
struct ImageBody<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

/// Image generation (`/images/generations`) with base64 payloads.
pub struct OpenAiImages {
    client: HttpClient,
    model: String,
    size: String,
}

impl OpenAiImages {
    pub fn new(config: HttpClientConfig, model: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            client: HttpClient::with_required_key(config, "OPENAI_API_KEY")?,
            model: model.into(),
            size: "1024x1024".to_string(),
        })
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }
}

#[async_trait]
impl ImageModel for OpenAiImages {
    async fn generate(&self, prompt: &str) -> ClientResult<Vec<u8>> {
        let url = self.client.url("images/generations");
        let key = self.client.resolve_key(None, "OPENAI_API_KEY")?;
        let body = ImageBody {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
            response_format: "b64_json",
        };

        let response = self
            .client
            .send(|http| http.post(&url).bearer_auth(key).json(&body))
            .await?;
        let parsed: ImageResponse = response.json().await?;

        let encoded = parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| ClientError::invalid_response("image response has no b64_json payload"))?;
        Ok(STANDARD.decode(encoded.as_bytes())?)
    }
}

#[derive(Serialize)]
struct SpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Speech synthesis (`/audio/speech`) returning MP3.
///
/// The endpoint infers the spoken language from the input text; the
/// requested language is only logged.
pub struct OpenAiSpeech {
    client: HttpClient,
    model: String,
    voice: String,
}

impl OpenAiSpeech {
    pub fn new(config: HttpClientConfig, model: impl Into<String>, voice: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            client: HttpClient::with_required_key(config, "OPENAI_API_KEY")?,
            model: model.into(),
            voice: voice.into(),
        })
    }
}

#[async_trait]
impl SpeechModel for OpenAiSpeech {
    async fn synthesize(&self, text: &str, language: &str) -> ClientResult<Vec<u8>> {
        let url = self.client.url("audio/speech");
        let key = self.client.resolve_key(None, "OPENAI_API_KEY")?;
        let body = SpeechBody {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: "mp3",
        };

        debug!(language, voice = %self.voice, "Synthesizing speech");
        let response = self
            .client
            .send(|http| http.post(&url).bearer_auth(key).json(&body))
            .await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ClientError::invalid_response("speech endpoint returned no audio"));
        }
        Ok(bytes.to_vec())
    }
}
