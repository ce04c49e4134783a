//! Runtime configuration for the reasoning agent and the HTTP server.
//!
//! All options are read from the environment exactly once, at startup, and
//! passed to constructors as plain structs. Nothing in the core reaches for
//! environment variables on its own.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default OpenAI-compatible endpoint for Gemini models.
pub const DEFAULT_MODEL_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/";

/// Errors that can occur while building configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No model credential was found.
    #[error("missing GEMINI_API_KEY (or OPENAI_API_KEY) in environment")]
    MissingApiKey,
    /// A recognized variable carried an unparseable value.
    #[error("invalid value for {var}: {value}")]
    InvalidValue {
        /// The offending environment variable.
        var: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },
}

/// Options recognized by the reasoning controller.
///
/// Mirrors the knobs of the underlying agent executor: model identifier,
/// temperature, credential, endpoint and the iteration bound, plus the
/// per-call timeouts and the conversation-memory cap.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model identifier, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// Sampling temperature for reasoning turns.
    pub temperature: f32,
    /// API credential for the model endpoint.
    pub api_key: String,
    /// OpenAI-compatible base URL.
    pub base_url: String,
    /// Maximum reasoning iterations per episode.
    pub max_iterations: usize,
    /// Timeout applied to each model call.
    pub model_timeout: Duration,
    /// Timeout applied to each tool call.
    pub tool_timeout: Duration,
    /// Turn-count bound on each conversation log.
    pub max_memory_turns: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.1,
            api_key: String::new(),
            base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            max_iterations: 15,
            model_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(30),
            max_memory_turns: 200,
        }
    }
}

impl AgentConfig {
    /// Builds the agent configuration from the environment.
    ///
    /// `GEMINI_API_KEY` is preferred, `OPENAI_API_KEY` accepted as a
    /// fallback; either must be present. `OPENAI_API_BASE`,
    /// `ASTROPULSE_MODEL`, `ASTROPULSE_TEMPERATURE` and
    /// `ASTROPULSE_MAX_ITERATIONS` override the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| ConfigError::MissingApiKey)?;

        let mut config = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(base_url) = env::var("OPENAI_API_BASE") {
            config.base_url = base_url;
        }
        if let Ok(model) = env::var("ASTROPULSE_MODEL") {
            config.model = model;
        }
        if let Ok(raw) = env::var("ASTROPULSE_TEMPERATURE") {
            config.temperature = raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "ASTROPULSE_TEMPERATURE",
                value: raw,
            })?;
        }
        if let Ok(raw) = env::var("ASTROPULSE_MAX_ITERATIONS") {
            config.max_iterations = raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "ASTROPULSE_MAX_ITERATIONS",
                value: raw,
            })?;
        }
        Ok(config)
    }
}

/// Options for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    pub bind_addr: String,
    /// Origin allowed by the CORS layer (the dashboard frontend).
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            allowed_origin: "http://localhost:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Builds the server configuration from `ASTROPULSE_HTTP_ADDR` and
    /// `ASTROPULSE_ALLOWED_ORIGIN`, defaulting both.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = env::var("ASTROPULSE_HTTP_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(origin) = env::var("ASTROPULSE_ALLOWED_ORIGIN") {
            config.allowed_origin = origin;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_defaults_match_executor_behavior() {
        let config = AgentConfig::default();
        assert_eq!(config.max_iterations, 15);
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.base_url.contains("openai"));
    }

    #[test]
    fn server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
    }
}
