//! Scripted chat client for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::{ChatCompletionClient, ChatMessage, ModelError};

/// Replays a fixed sequence of replies, one per `complete` call.
///
/// Entries are either completion text or an error message to fail that call
/// with. An exhausted script fails every further call, so tests notice loops
/// that run longer than scripted.
#[derive(Debug, Default)]
pub struct ScriptedChatClient {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChatClient {
    /// Builds a client that answers with `replies` in order.
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Builds a client from explicit reply/failure entries.
    pub fn from_script(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queues one more successful reply.
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(Ok(reply.into()));
    }

    /// Every message list this client has been called with, in order.
    pub fn recorded_prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().expect("prompt lock poisoned").clone()
    }
}

#[async_trait]
impl ChatCompletionClient for ScriptedChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        self.prompts
            .lock()
            .expect("prompt lock poisoned")
            .push(messages.to_vec());
        let next = self
            .script
            .lock()
            .expect("script lock poisoned")
            .pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(ModelError::Api(message)),
            None => Err(ModelError::Api("scripted client exhausted".to_string())),
        }
    }
}
