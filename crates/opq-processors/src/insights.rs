//! Insight synthesis: turns execution history into a short set of findings.

use async_trait::async_trait;
use tracing::debug;

use opq_core::{
    CompletionRequest, Error, OperationKind, OperationProcessor, ProcessContext, ProcessOutcome,
};

use crate::prompt;

const PROMPT: &str = r#"You are synthesizing insights from the execution history of a business-process tracker. Look for trends, bottlenecks, and anomalies across the WHOLE history, not just the most recent entries.

Organization context (may be empty):
{context}

History:
{input}

Respond with 3-6 insights, one per line, each starting with "- ". Each insight must be a single concrete observation grounded in the history. No preamble, no closing remarks."#;

pub struct InsightSynthesisProcessor;

impl InsightSynthesisProcessor {
    pub fn new() -> Self {
        Self
    }

    fn parse_insights(text: &str) -> Vec<String> {
        text.lines()
            .map(|l| l.trim().trim_start_matches(['-', '*']).trim())
            .filter(|l| !l.is_empty())
            .map(|l| l.to_string())
            .collect()
    }
}

impl Default for InsightSynthesisProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationProcessor for InsightSynthesisProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::InsightSynthesis
    }

    async fn process(&self, ctx: &ProcessContext) -> Result<ProcessOutcome, Error> {
        ctx.report(10, "initializing", "preparing synthesis prompt");
        let rendered = prompt::render(PROMPT, ctx);

        ctx.report(60, "processing", "waiting for model completion");
        let response = ctx
            .complete(
                CompletionRequest::new(rendered)
                    .with_max_tokens(1024)
                    .with_temperature(0.4),
            )
            .await?;

        ctx.report(90, "finalizing", "parsing insights");
        let insights = Self::parse_insights(&response.text);
        if insights.is_empty() {
            return Err(Error::serialization("No insights in response"));
        }
        debug!("parsed {} insights", insights.len());

        Ok(ProcessOutcome::new(
            serde_json::json!({ "insights": insights }),
            &response,
        ))
    }
}
