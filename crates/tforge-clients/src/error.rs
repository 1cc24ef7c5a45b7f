//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload decode error: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl ClientError {
    pub fn missing_credential(what: impl Into<String>) -> Self {
        Self::MissingCredential(what.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ServiceUnavailable(_) | ClientError::Timeout(_) => true,
            ClientError::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            ClientError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::RequestFailed { status: 503, body: String::new() }.is_retryable());
        assert!(ClientError::RequestFailed { status: 429, body: String::new() }.is_retryable());
        assert!(!ClientError::RequestFailed { status: 401, body: String::new() }.is_retryable());
        assert!(ClientError::Timeout(30).is_retryable());
        assert!(!ClientError::missing_credential("OPENAI_API_KEY").is_retryable());
        assert!(!ClientError::invalid_response("no choices").is_retryable());
    }
}
