//! Parses the model's reasoning-format replies into decisions.
//!
//! The contract allows exactly two shapes: an action proposal
//! (`Action:` + `Action Input:`) or a final-answer declaration
//! (`Final Answer:`). Anything else — including a reply carrying both — is a
//! format violation the loop recovers from.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

const FINAL_ANSWER_TAG: &str = "Final Answer:";

/// What the model decided to do this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelDecision {
    /// Terminate the episode with this answer.
    Final { thought: String, answer: String },
    /// Invoke a tool with the given raw input text.
    Act {
        thought: String,
        tool: String,
        input: String,
    },
}

/// Ways a reply can violate the reasoning format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatViolation {
    #[error("missing 'Action:' after 'Thought:'")]
    MissingAction,
    #[error("missing 'Action Input:' after 'Action:'")]
    MissingActionInput,
    #[error("reply contains both a final answer and an action")]
    AmbiguousDecision,
}

fn action_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)Action\s*:\s*(.*?)\s*Action\s*Input\s*:\s*(.*)").expect("valid pattern")
    })
}

/// Parses one model reply.
pub fn parse(response: &str) -> Result<ModelDecision, FormatViolation> {
    let has_answer = response.contains(FINAL_ANSWER_TAG);

    if let Some(captures) = action_pattern().captures(response) {
        if has_answer {
            return Err(FormatViolation::AmbiguousDecision);
        }
        let tool = captures[1]
            .trim()
            .trim_matches(&['"', '\'', '`'][..])
            .to_string();
        // Some models keep narrating past the input; everything from a
        // self-written "Observation:" line on is theirs to hallucinate, not
        // ours to parse.
        let input = captures[2]
            .split("\nObservation")
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        return Ok(ModelDecision::Act {
            thought: leading_thought(response),
            tool,
            input,
        });
    }

    if has_answer {
        let answer = response
            .rsplit(FINAL_ANSWER_TAG)
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        return Ok(ModelDecision::Final {
            thought: leading_thought(response),
            answer,
        });
    }

    if response.contains("Action:") {
        Err(FormatViolation::MissingActionInput)
    } else {
        Err(FormatViolation::MissingAction)
    }
}

/// The free-text rationale before the first `Action:`/`Final Answer:` tag,
/// with a leading `Thought:` label stripped. May be empty.
fn leading_thought(response: &str) -> String {
    let head = response.split("Action:").next().unwrap_or(response);
    let head = head.split(FINAL_ANSWER_TAG).next().unwrap_or(head).trim();
    head.strip_prefix("Thought:").unwrap_or(head).trim().to_string()
}
