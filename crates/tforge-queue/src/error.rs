//! Errors from job submission, status records and progress delivery.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Redis could not be reached.
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    #[error("Job rejected by queue: {0}")]
    Rejected(String),

    /// The in-process executor has gone away.
    #[error("Queue closed")]
    Closed,

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Malformed queue payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl QueueError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Whether retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Closed => true,
            Self::Redis(e) => e.is_connection_dropped() || e.is_io_error() || e.is_timeout(),
            Self::Rejected(_) | Self::Payload(_) => false,
        }
    }
}
