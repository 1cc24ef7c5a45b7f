//! Shared HTTP plumbing: configuration, retries and status handling.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Connection settings for one upstream service.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Credential sent with each request, if the service needs one
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for transient failures
    pub max_retries: u32,
}

impl HttpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }

    /// Read `{PREFIX}_BASE_URL`, `{PREFIX}_API_KEY`, `{PREFIX}_TIMEOUT_SECS`
    /// and `{PREFIX}_MAX_RETRIES`.
    pub fn from_env(prefix: &str, default_base_url: &str) -> Self {
        let var = |name: &str| std::env::var(format!("{}_{}", prefix, name)).ok();
        Self {
            base_url: var("BASE_URL").unwrap_or_else(|| default_base_url.to_string()),
            api_key: var("API_KEY").filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(
                var("TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: var("MAX_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// reqwest client bound to one service.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    http: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    pub(crate) fn new(config: HttpClientConfig) -> ClientResult<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            ClientError::invalid_config(format!("invalid base URL {:?}: {}", config.base_url, e))
        })?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tubeforge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    /// Like [`HttpClient::new`] but fails when no API key is configured.
    pub(crate) fn with_required_key(config: HttpClientConfig, what: &str) -> ClientResult<Self> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ClientError::missing_credential(what));
        }
        Self::new(config)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub(crate) fn api_key(&self) -> Option<&str> {
        self.config.api_key.as_deref()
    }

    /// Per-call credential if given, else the configured one.
    pub(crate) fn resolve_key<'a>(&'a self, credential: Option<&'a str>, what: &str) -> ClientResult<&'a str> {
        credential
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key())
            .ok_or_else(|| ClientError::missing_credential(what))
    }

    /// Send the request built by `build`, retrying transient failures.
    /// Non-2xx responses become [`ClientError::RequestFailed`].
    pub(crate) async fn send<F>(&self, build: F) -> ClientResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let timeout_secs = self.config.timeout.as_secs();
        let http = &self.http;
        let build = &build;
        with_retry(self.config.max_retries, move || async move {
            let response = build(http).send().await.map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(timeout_secs)
                } else {
                    ClientError::Network(e)
                }
            })?;
            check_status(response).await
        })
        .await
    }
}

async fn check_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!("Upstream returned {}: {}", status, body);
    Err(ClientError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}

/// Run `operation`, retrying retryable errors with exponential backoff.
pub async fn with_retry<F, Fut, T>(max_retries: u32, operation: F) -> ClientResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                warn!(
                    "Request failed (attempt {}), retrying in {:?}: {}",
                    attempt + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_url_joining() {
        let client = HttpClient::new(HttpClientConfig::new("https://api.example.com/v1/")).unwrap();
        assert_eq!(client.url("/chat/completions"), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = HttpClient::new(HttpClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn test_required_key() {
        let err = HttpClient::with_required_key(HttpClientConfig::new("https://x.test"), "OPENAI_API_KEY")
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingCredential(_)));
        assert!(HttpClient::with_required_key(
            HttpClientConfig::new("https://x.test").with_api_key("k"),
            "OPENAI_API_KEY"
        )
        .is_ok());
    }

    #[test]
    fn test_resolve_key_prefers_call_credential() {
        let client = HttpClient::new(HttpClientConfig::new("https://x.test").with_api_key("configured")).unwrap();
        assert_eq!(client.resolve_key(Some("row"), "key").unwrap(), "row");
        assert_eq!(client.resolve_key(Some(""), "key").unwrap(), "configured");
        assert_eq!(client.resolve_key(None, "key").unwrap(), "configured");
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: ClientResult<()> = with_retry(3, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::RequestFailed { status: 400, body: "bad".into() })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(2, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ClientError::RequestFailed { status: 503, body: String::new() })
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
