//! Recommendation generation: proposes next actions for an initiative.

use async_trait::async_trait;
use tracing::debug;

use opq_core::{
    CompletionRequest, Error, OperationKind, OperationProcessor, ProcessContext, ProcessOutcome,
};

use crate::prompt;

const PROMPT: &str = r#"You are recommending next actions for a business initiative. Base every recommendation on the provided content; do not invent facts.

Organization context (may be empty):
{context}

Initiative content:
{input}

Respond with ONLY a JSON array of 3-5 objects, each with keys "title", "rationale", and "impact" (one of "high", "medium", "low"). No prose around the JSON."#;

pub struct RecommendationProcessor;

impl RecommendationProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Parse the model output into a recommendation list. Falls back to
    /// treating non-JSON output as one recommendation per non-empty line.
    fn parse_recommendations(text: &str) -> (serde_json::Value, f32) {
        let stripped = prompt::strip_code_fences(text);
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(stripped) {
            if value.is_array() {
                return (value, 0.9);
            }
        }

        let lines: Vec<serde_json::Value> = stripped
            .lines()
            .map(|l| l.trim_start_matches(['-', '*', ' ']).trim())
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::json!({ "title": l, "rationale": "", "impact": "medium" }))
            .collect();
        (serde_json::Value::Array(lines), 0.5)
    }
}

impl Default for RecommendationProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationProcessor for RecommendationProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::RecommendationGeneration
    }

    async fn process(&self, ctx: &ProcessContext) -> Result<ProcessOutcome, Error> {
        ctx.report(10, "initializing", "preparing recommendation prompt");
        let rendered = prompt::render(PROMPT, ctx);

        ctx.report(60, "processing", "waiting for model completion");
        let response = ctx
            .complete(
                CompletionRequest::new(rendered)
                    .with_max_tokens(1024)
                    .with_temperature(0.5),
            )
            .await?;

        ctx.report(90, "finalizing", "parsing recommendations");
        let (recommendations, confidence) = Self::parse_recommendations(&response.text);
        if recommendations.as_array().map_or(true, |a| a.is_empty()) {
            return Err(Error::serialization("No recommendations in response"));
        }
        debug!(
            "parsed {} recommendations (confidence {confidence})",
            recommendations.as_array().map(|a| a.len()).unwrap_or(0)
        );

        Ok(
            ProcessOutcome::new(
                serde_json::json!({ "recommendations": recommendations }),
                &response,
            )
            .with_confidence(confidence),
        )
    }
}
