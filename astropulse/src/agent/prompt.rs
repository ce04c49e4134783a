//! Prompt assembly for the reasoning loop.

use serde_json::Value;

use super::ReasoningStep;
use crate::memory::{Role, Turn};
use crate::models::{ChatMessage, MessageRole};
use crate::tools::ToolRegistry;

/// Persona and reasoning-format contract shown to the model on every turn.
const SYSTEM_TEMPLATE: &str = "You are AstroPulse Solar Analyst, an autonomous AI specializing in \
solar weather analysis.

TOOLS AVAILABLE:
{tools}

Follow this reasoning format:
Thought: ...
Action: ...
Action Input: ...
Observation: ...
Repeat until done, then:
Final Answer: ...

You can use these tool names: {tool_names}

Note: When using the PredictMagnetosphereImpact tool, its output contains an \
explanation field. Use it in your final answer to explain why the Kp index \
might be high even when the impact probability is low.

If the query is a simple greeting, sign-off, or a general factual question \
that does not require real-time solar data, do not use any tools; reply with \
a Thought line and a Final Answer line only. If the query is too vague to \
act on, do not run tools; ask for clarification in your Final Answer.

Note: If a Kp index is needed for analysis, use FetchNASA_KpIndex before \
calling CalculateSatelliteVulnerability.

Note: Use prior context from the conversation to maintain continuity between \
related queries.";

/// Builds the full message list for one model turn: system contract,
/// remembered conversation, then the query with the reasoning log so far.
pub(super) fn build_messages(
    question: &str,
    history: &[Turn],
    steps: &[ReasoningStep],
    registry: &ToolRegistry,
) -> Vec<ChatMessage> {
    let tool_lines: Vec<String> = registry
        .list()
        .iter()
        .map(|t| format!("{}: {}", t.name(), t.description()))
        .collect();
    let system = SYSTEM_TEMPLATE
        .replace("{tools}", &tool_lines.join("\n"))
        .replace("{tool_names}", &registry.names().join(", "));

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    for turn in history {
        let role = match turn.role {
            Role::User => MessageRole::User,
            Role::Assistant => MessageRole::Assistant,
        };
        messages.push(ChatMessage {
            role,
            content: turn.text.clone(),
        });
    }

    let mut request = format!("User Question: {question}");
    if !steps.is_empty() {
        request.push_str("\n\nCurrent reasoning log (do not repeat this in your answer):\n");
        for step in steps {
            request.push_str(&render_step(step));
        }
        request.push_str("Continue from the last observation.");
    }
    messages.push(ChatMessage::user(request));
    messages
}

fn render_step(step: &ReasoningStep) -> String {
    format!(
        "Thought: {}\nAction: {}\nAction Input: {}\nObservation: {}\n",
        step.thought,
        step.action,
        compact(&step.input),
        compact(&step.observation),
    )
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
