//! Tool contract and registry for the reasoning loop.
//!
//! A tool is an opaque, possibly slow, possibly failing async function over
//! a normalized argument bag. The registry maps unique names to tools and
//! preserves registration order, which defines the action vocabulary shown
//! to the model.

mod catalog;
mod donki;
pub mod heuristics;

pub use catalog::{standard_registry, standard_tools};
pub use donki::{DonkiClient, DonkiConfig};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by tool implementations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments could not be interpreted even leniently.
    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),
    /// An upstream data source failed.
    #[error("upstream request failed: {0}")]
    Upstream(String),
    /// The tool itself failed.
    #[error("tool execution failed: {0}")]
    Execution(String),
}

/// Errors raised by the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A tool with the same name is already registered.
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
    /// No tool with the requested name exists.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

/// A deterministic collaborator the reasoning loop may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name; the model addresses the tool by this string.
    fn name(&self) -> &str;

    /// One-line description used to build the model's action vocabulary.
    fn description(&self) -> &str;

    /// Executes the tool over a normalized argument bag.
    async fn invoke(&self, args: &Value) -> Result<Value, ToolError>;
}

/// Ordered mapping from tool name to tool.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, failing if its name is already taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(RegistryError::DuplicateTool(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Looks a tool up by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, RegistryError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    /// All tools, in registration order.
    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl std::fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.name()).finish()
    }
}
