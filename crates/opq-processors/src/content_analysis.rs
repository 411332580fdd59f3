//! Content analysis: distills a work item into themes, risks, and effort signals.

use async_trait::async_trait;
use tracing::debug;

use opq_core::{
    CompletionRequest, Error, OperationKind, OperationProcessor, ProcessContext, ProcessOutcome,
};

use crate::prompt;

const PROMPT: &str = r#"You are analyzing a work item from a business-process tracker. Read the ENTIRE content before answering.

Your analysis should cover:
1. What is this item ABOUT? (the central problem or request)
2. What THEMES does it touch? (e.g. reliability, billing, onboarding)
3. What RISKS or blockers does it imply?

Organization context (may be empty):
{context}

Item content:
{input}

Respond with ONLY a 2-4 sentence analysis covering subject, themes, and risks. No formatting or preamble."#;

pub struct ContentAnalysisProcessor;

impl ContentAnalysisProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContentAnalysisProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationProcessor for ContentAnalysisProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::ContentAnalysis
    }

    async fn process(&self, ctx: &ProcessContext) -> Result<ProcessOutcome, Error> {
        ctx.report(10, "initializing", "preparing analysis prompt");
        let rendered = prompt::render(PROMPT, ctx);

        ctx.report(60, "processing", "waiting for model completion");
        let response = ctx
            .complete(
                CompletionRequest::new(rendered)
                    .with_max_tokens(512)
                    .with_temperature(0.3),
            )
            .await?;

        ctx.report(90, "finalizing", "assembling analysis");
        let analysis = response.text.trim().to_string();
        if analysis.is_empty() {
            return Err(Error::serialization("Empty analysis response"));
        }
        debug!("content analysis produced {} chars", analysis.len());

        Ok(ProcessOutcome::new(
            serde_json::json!({ "analysis": analysis }),
            &response,
        ))
    }
}
