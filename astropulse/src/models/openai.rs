//! OpenAI-compatible chat client (Chat Completions API).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::{ChatCompletionClient, ChatMessage, ModelError};
use crate::config::AgentConfig;

/// Chat client for any endpoint speaking the OpenAI Chat Completions
/// protocol. The default deployment points it at Gemini's compatibility
/// layer, but the base URL is caller-supplied.
#[derive(Debug)]
pub struct OpenAiChatClient {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiChatClient {
    /// Builds a client from the agent configuration's model options.
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatCompletionClient for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = RequestBody {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => ModelError::Auth(text),
                429 => ModelError::RateLimit(text),
                _ => ModelError::Api(text),
            });
        }

        let parsed: ResponseBody = serde_json::from_str(&text)
            .map_err(|e| ModelError::Parsing(format!("{e}: {text}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModelError::Parsing("response carried no completion text".to_string()))
    }
}
