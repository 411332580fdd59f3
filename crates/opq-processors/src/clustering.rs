//! Clustering: groups a batch of work items under short thematic labels.

use async_trait::async_trait;
use tracing::debug;

use opq_core::{
    CompletionRequest, Error, OperationKind, OperationProcessor, ProcessContext, ProcessOutcome,
};

use crate::prompt;

const PROMPT: &str = r#"You are clustering work items from a business-process tracker into themes. Read ALL items before labelling.

Generate 3-8 short, lowercase cluster labels that capture:
- Recurring subject matter (e.g. billing, onboarding, api-latency)
- Affected areas or teams if dominant
- Use lowercase with hyphens for multi-word labels

Organization context (may be empty):
{context}

Items:
{input}

Respond with ONLY a comma-separated list of labels. Example: billing, api-latency, onboarding"#;

pub struct ClusteringProcessor;

impl ClusteringProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClusteringProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationProcessor for ClusteringProcessor {
    fn kind(&self) -> OperationKind {
        OperationKind::Clustering
    }

    async fn process(&self, ctx: &ProcessContext) -> Result<ProcessOutcome, Error> {
        ctx.report(10, "initializing", "preparing clustering prompt");
        let rendered = prompt::render(PROMPT, ctx);

        ctx.report(60, "processing", "waiting for model completion");
        let response = ctx
            .complete(
                CompletionRequest::new(rendered)
                    .with_max_tokens(256)
                    .with_temperature(0.2),
            )
            .await?;

        ctx.report(90, "finalizing", "parsing cluster labels");
        let clusters = prompt::parse_labels(&response.text);
        if clusters.is_empty() {
            return Err(Error::serialization("No cluster labels in response"));
        }
        debug!("parsed {} cluster labels", clusters.len());

        Ok(ProcessOutcome::new(
            serde_json::json!({ "clusters": clusters }),
            &response,
        ))
    }
}
