//! Chat model clients.
//!
//! The reasoning loop only needs one capability from a model: turn a message
//! list into text. [`ChatCompletionClient`] captures that contract;
//! [`OpenAiChatClient`] implements it against any OpenAI-compatible endpoint
//! (the deployment target is Gemini's compatibility layer), and
//! [`ScriptedChatClient`] replays canned replies for tests.

mod client;
mod mock;
mod openai;

pub use client::{ChatCompletionClient, ChatMessage, MessageRole, ModelError};
pub use mock::ScriptedChatClient;
pub use openai::OpenAiChatClient;
