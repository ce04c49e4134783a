//! Packages episode results for callers.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::agent::AgentEpisode;
use crate::models::{ChatCompletionClient, ChatMessage, ModelError};

/// How much of the report the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// A 2-3 sentence condensation produced by a secondary model call.
    Brief,
    /// The final answer verbatim.
    Full,
}

impl ReportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportMode::Brief => "brief",
            ReportMode::Full => "full",
        }
    }
}

/// Assembler failures, distinct from episode failures: the underlying
/// episode may well have succeeded.
#[derive(Debug, Error)]
pub enum AssemblerError {
    /// The episode carries no answer to assemble.
    #[error("cannot assemble a report for a failed episode: {0}")]
    EpisodeFailed(String),
    /// The condensation call failed; no silent fallback to the full text.
    #[error("summary generation failed: {0}")]
    Summarization(#[from] ModelError),
}

const SUMMARY_INSTRUCTION: &str = "Summarize the following solar activity report in 2-3 short \
sentences. Highlight the overall trend, strongest flare, risk level, and Earth impact \
likelihood.";

/// Turns a finished episode into caller-facing report text.
pub struct ResultAssembler {
    model: Arc<dyn ChatCompletionClient>,
}

impl ResultAssembler {
    pub fn new(model: Arc<dyn ChatCompletionClient>) -> Self {
        Self { model }
    }

    /// Produces the report in the requested mode.
    ///
    /// FULL returns the episode's (already marker-truncated) final answer
    /// verbatim. BRIEF condenses it through the model; a condensation
    /// failure surfaces as [`AssemblerError::Summarization`] rather than
    /// degrading to the full text.
    pub async fn assemble(
        &self,
        episode: &AgentEpisode,
        mode: ReportMode,
    ) -> Result<String, AssemblerError> {
        let report = episode.final_answer.as_deref().ok_or_else(|| {
            AssemblerError::EpisodeFailed(
                episode
                    .error
                    .clone()
                    .unwrap_or_else(|| "no final answer".to_string()),
            )
        })?;

        match mode {
            ReportMode::Full => Ok(report.to_string()),
            ReportMode::Brief => {
                debug!(report_len = report.len(), "condensing report");
                let request = [ChatMessage::user(format!("{SUMMARY_INSTRUCTION}\n\n{report}"))];
                let summary = self.model.complete(&request).await?;
                Ok(summary.trim().to_string())
            }
        }
    }
}
