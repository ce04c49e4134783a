//! # AstroPulse
//!
//! Space-weather advisory backend. AstroPulse fetches solar-flare and
//! geomagnetic-index data from NASA DONKI and NOAA SWPC, derives heuristic
//! risk assessments, and exposes both raw-tool HTTP endpoints and a
//! natural-language agent endpoint where a language model decides which
//! tools to call and narrates the results.
//!
//! The engineering core is the reasoning loop in [`agent`]: a bounded state
//! machine alternating between model-proposed actions and deterministic tool
//! execution, with every tool payload funneled through [`normalize`] and an
//! auditable step trace accumulated per episode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use astropulse::{
//!     AgentConfig, ConversationStore, DonkiClient, DonkiConfig, OpenAiChatClient,
//!     SolarAnalystAgent,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AgentConfig::from_env()?;
//! let model = Arc::new(OpenAiChatClient::new(&config));
//! let donki = Arc::new(DonkiClient::new(DonkiConfig::from_env()));
//! let registry = astropulse::tools::standard_registry(donki)?;
//! let memory = Arc::new(ConversationStore::new(config.max_memory_turns));
//!
//! let agent = SolarAnalystAgent::new(config, model, registry, memory);
//! let episode = agent.query("How active was the sun this week?", "demo").await;
//! println!("{:?}", episode.final_answer);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod assembler;
pub mod cancellation;
pub mod config;
pub mod http;
pub mod memory;
pub mod models;
pub mod normalize;
pub mod tools;

pub use agent::{
    AgentEpisode, EpisodeStatus, ReasoningStep, SolarAnalystAgent, EXCEPTION_ACTION,
    FORMAT_VIOLATION_MARKER,
};
pub use assembler::{AssemblerError, ReportMode, ResultAssembler};
pub use cancellation::CancellationToken;
pub use config::{AgentConfig, ConfigError, ServerConfig};
pub use memory::{ConversationMemory, ConversationStore, Role, Turn};
pub use models::{
    ChatCompletionClient, ChatMessage, MessageRole, ModelError, OpenAiChatClient,
    ScriptedChatClient,
};
pub use normalize::{normalize_args, normalize_result, normalize_value};
pub use tools::{DonkiClient, DonkiConfig, RegistryError, Tool, ToolError, ToolRegistry};

/// Current crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
