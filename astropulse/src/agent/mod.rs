//! The reasoning controller: a bounded tool-calling loop over the registry.
//!
//! One [`SolarAnalystAgent::query`] call runs one episode. Each iteration
//! asks the model for the next move, executes the proposed tool, and records
//! a [`ReasoningStep`]; the loop ends when the model declares a final answer,
//! an unrecoverable fault occurs, or the iteration bound is hit. Per-step
//! faults (bad format, unknown tool, tool failure, late timeouts) become
//! observations the model can react to — they never abort the episode.

mod parser;
mod prompt;

pub use parser::{FormatViolation, ModelDecision};

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::cancellation::CancellationToken;
use crate::config::AgentConfig;
use crate::memory::{ConversationStore, Role};
use crate::models::ChatCompletionClient;
use crate::normalize::{normalize_args, normalize_result};
use crate::tools::ToolRegistry;

/// Marker prefixed to synthetic observations for malformed model replies.
/// Final answers are truncated at its first occurrence before delivery.
pub const FORMAT_VIOLATION_MARKER: &str = "Invalid Format";

/// Action name recorded for steps that captured a per-step fault rather
/// than a tool execution.
pub const EXCEPTION_ACTION: &str = "_Exception";

/// One thought/action/observation unit within an episode. Never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReasoningStep {
    /// The model's free-text rationale; may be empty.
    pub thought: String,
    /// Tool name, or [`EXCEPTION_ACTION`] for recovered faults.
    pub action: String,
    /// Normalized tool input.
    pub input: Value,
    /// Normalized tool output or synthetic fault description.
    pub observation: Value,
}

/// Terminal status of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeStatus {
    Success,
    Failed,
}

/// One complete run of the reasoning loop for a single query.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentEpisode {
    /// The user's question.
    pub query: String,
    /// Every recorded step, including recovered faults, in order.
    pub steps: Vec<ReasoningStep>,
    /// Set exactly when `status` is `Success`.
    pub final_answer: Option<String>,
    pub status: EpisodeStatus,
    /// Set exactly when `status` is `Failed`.
    pub error: Option<String>,
}

impl AgentEpisode {
    pub fn is_success(&self) -> bool {
        self.status == EpisodeStatus::Success
    }
}

/// Fault of a single loop step: recoverable faults become observations,
/// fatal ones end the episode.
enum StepFault {
    Recoverable(String),
    Fatal(String),
}

/// The autonomous space-weather analyst.
pub struct SolarAnalystAgent {
    config: AgentConfig,
    model: Arc<dyn ChatCompletionClient>,
    registry: ToolRegistry,
    memory: Arc<ConversationStore>,
}

impl SolarAnalystAgent {
    /// Builds an agent over the given model, tool set and memory store.
    pub fn new(
        config: AgentConfig,
        model: Arc<dyn ChatCompletionClient>,
        registry: ToolRegistry,
        memory: Arc<ConversationStore>,
    ) -> Self {
        info!(
            tools = registry.len(),
            max_iterations = config.max_iterations,
            "solar analyst agent ready"
        );
        Self {
            config,
            model,
            registry,
            memory,
        }
    }

    /// The memory store this agent reads and writes.
    pub fn memory(&self) -> &Arc<ConversationStore> {
        &self.memory
    }

    /// Runs one reasoning episode for `question` within `session`.
    ///
    /// Never returns an error: every failure path is captured in the
    /// returned episode's `status` and `error` fields. On success the
    /// session memory gains the `(question, final_answer)` pair; failed or
    /// cancelled episodes leave memory untouched.
    pub async fn query(&self, question: &str, session: &str) -> AgentEpisode {
        self.query_with_cancellation(question, session, None).await
    }

    /// Like [`SolarAnalystAgent::query`], cancellable at either suspension
    /// point (model call or tool call).
    pub async fn query_with_cancellation(
        &self,
        question: &str,
        session: &str,
        cancellation: Option<CancellationToken>,
    ) -> AgentEpisode {
        info!(question, session, "starting reasoning episode");
        let memory = self.memory.session(session).await;
        let history = memory.snapshot().await;
        let mut steps = Vec::new();

        match self
            .run_loop(question, &history, &mut steps, cancellation.as_ref())
            .await
        {
            Ok(answer) => {
                let answer = truncate_at_marker(&answer);
                memory.append(Role::User, question).await;
                memory.append(Role::Assistant, answer.clone()).await;
                info!(steps = steps.len(), "episode completed");
                AgentEpisode {
                    query: question.to_string(),
                    steps,
                    final_answer: Some(answer),
                    status: EpisodeStatus::Success,
                    error: None,
                }
            }
            Err(reason) => {
                warn!(error = %reason, steps = steps.len(), "episode failed");
                AgentEpisode {
                    query: question.to_string(),
                    steps,
                    final_answer: None,
                    status: EpisodeStatus::Failed,
                    error: Some(reason),
                }
            }
        }
    }

    /// Runs a self-directed 7-day solar activity analysis.
    pub async fn autonomous_check(&self, session: &str) -> AgentEpisode {
        let prompt = "Perform an autonomous 7-day solar activity analysis:\n\
                      1. Fetch NASA data\n2. Analyze escalation\n3. Predict impacts\n\
                      4. Assess satellite vulnerability\n5. Generate operational alert";
        self.query(prompt, session).await
    }

    async fn run_loop(
        &self,
        question: &str,
        history: &[crate::memory::Turn],
        steps: &mut Vec<ReasoningStep>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<String, String> {
        for iteration in 0..self.config.max_iterations {
            let messages = prompt::build_messages(question, history, steps, &self.registry);
            let response = match self
                .call_model(&messages, cancellation, iteration == 0)
                .await
            {
                Ok(text) => text,
                Err(StepFault::Fatal(reason)) => return Err(reason),
                Err(StepFault::Recoverable(reason)) => {
                    steps.push(fault_step(String::new(), Value::Null, reason));
                    continue;
                }
            };
            debug!(iteration, response_len = response.len(), "model responded");

            match parser::parse(&response) {
                Ok(ModelDecision::Final { answer, .. }) => return Ok(answer),
                Ok(ModelDecision::Act {
                    thought,
                    tool,
                    input,
                }) => {
                    let args = normalize_args(&input);
                    match self.execute_tool(&tool, &args, cancellation).await {
                        Ok(observation) => steps.push(ReasoningStep {
                            thought,
                            action: tool,
                            input: args,
                            observation,
                        }),
                        Err(StepFault::Fatal(reason)) => return Err(reason),
                        Err(StepFault::Recoverable(reason)) => {
                            steps.push(fault_step(thought, args, reason));
                        }
                    }
                }
                Err(violation) => {
                    debug!(%violation, "model reply violated the reasoning format");
                    steps.push(fault_step(
                        response,
                        Value::Null,
                        format!("{FORMAT_VIOLATION_MARKER}: {violation}"),
                    ));
                }
            }
        }
        Err(format!(
            "iteration limit exceeded ({} iterations)",
            self.config.max_iterations
        ))
    }

    async fn call_model(
        &self,
        messages: &[crate::models::ChatMessage],
        cancellation: Option<&CancellationToken>,
        first_turn: bool,
    ) -> Result<String, StepFault> {
        let call = tokio::time::timeout(self.config.model_timeout, self.model.complete(messages));
        let outcome = match cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(StepFault::Fatal("episode cancelled".to_string())),
                outcome = call => outcome,
            },
            None => call.await,
        };
        match outcome {
            Err(_) if first_turn => Err(StepFault::Fatal(format!(
                "model call timed out after {:?} on the first turn",
                self.config.model_timeout
            ))),
            Err(_) => Err(StepFault::Recoverable(format!(
                "model call timed out after {:?}",
                self.config.model_timeout
            ))),
            // Transport and auth failures are not something another
            // iteration can fix.
            Ok(Err(e)) => Err(StepFault::Fatal(e.to_string())),
            Ok(Ok(text)) => Ok(text),
        }
    }

    async fn execute_tool(
        &self,
        name: &str,
        args: &Value,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Value, StepFault> {
        let tool = match self.registry.resolve(name) {
            Ok(tool) => tool,
            Err(e) => {
                return Err(StepFault::Recoverable(format!(
                    "{e}. Known tools: {}",
                    self.registry.names().join(", ")
                )))
            }
        };

        let call = tokio::time::timeout(self.config.tool_timeout, tool.invoke(args));
        let outcome = match cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(StepFault::Fatal("episode cancelled".to_string())),
                outcome = call => outcome,
            },
            None => call.await,
        };
        match outcome {
            Err(_) => Err(StepFault::Recoverable(format!(
                "tool '{name}' timed out after {:?}",
                self.config.tool_timeout
            ))),
            Ok(Err(e)) => Err(StepFault::Recoverable(format!("tool '{name}' failed: {e}"))),
            Ok(Ok(raw)) => Ok(normalize_result(raw)),
        }
    }
}

fn fault_step(thought: String, input: Value, reason: String) -> ReasoningStep {
    ReasoningStep {
        thought,
        action: EXCEPTION_ACTION.to_string(),
        input,
        observation: json!({ "error": reason }),
    }
}

/// Cuts a final answer at the first format-violation marker left behind by a
/// malformed turn. The step trace is unaffected.
fn truncate_at_marker(answer: &str) -> String {
    match answer.find(FORMAT_VIOLATION_MARKER) {
        Some(idx) => answer[..idx].trim().to_string(),
        None => answer.trim().to_string(),
    }
}
