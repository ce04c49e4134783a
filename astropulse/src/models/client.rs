//! The chat-completion contract consumed by the reasoning loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a model client.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Missing or rejected credential.
    #[error("model authentication failed: {0}")]
    Auth(String),
    /// Upstream throttling.
    #[error("model rate limited: {0}")]
    RateLimit(String),
    /// Transport-level failure.
    #[error("model request failed: {0}")]
    Network(String),
    /// Non-2xx response that is not auth or throttling.
    #[error("model API error: {0}")]
    Api(String),
    /// The response body did not match the expected schema.
    #[error("model returned an unreadable response: {0}")]
    Parsing(String),
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A chat model: message list in, completion text out.
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    /// Produces a completion for the given conversation.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}
