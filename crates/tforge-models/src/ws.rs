//! WebSocket message types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Frame pushed to live progress subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Human-readable progress line
    Log { message: String },
}

impl WsMessage {
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            WsMessage::Log { message } => message,
        }
    }

    pub fn type_str(&self) -> &'static str {
        match self {
            WsMessage::Log { .. } => "log",
        }
    }
}
