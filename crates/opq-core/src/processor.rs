//! Per-kind processor plumbing.
//!
//! Each operation kind maps to an `OperationProcessor`. Processors receive a
//! `ProcessContext` that carries the operation, the completion provider, and
//! a progress reporter; the queue never needs to change when a kind is added.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;
use crate::operation::{Operation, OperationKind, Usage};
use crate::provider::{CompletionProvider, CompletionRequest, CompletionResponse};

/// Sink for intermediate progress published from inside a processor.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, percent: u8, step: &str, message: &str);
}

/// Scheduling and caching defaults registered alongside a processor.
#[derive(Debug, Clone, Copy)]
pub struct KindProfile {
    /// Used for the estimated-completion timestamp when the caller gives no
    /// duration hint.
    pub default_duration: Duration,
    /// Result cache time-to-live for this kind.
    pub cache_ttl: Duration,
}

impl KindProfile {
    pub fn new(default_duration: Duration, cache_ttl: Duration) -> Self {
        Self {
            default_duration,
            cache_ttl,
        }
    }
}

/// Everything a processor needs to execute one operation.
pub struct ProcessContext {
    operation: Operation,
    provider: Arc<dyn CompletionProvider>,
    reporter: Arc<dyn ProgressReporter>,
    provider_timeout: Duration,
}

impl ProcessContext {
    pub fn new(
        operation: Operation,
        provider: Arc<dyn CompletionProvider>,
        reporter: Arc<dyn ProgressReporter>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            operation,
            provider,
            reporter,
            provider_timeout,
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn input_text(&self) -> &str {
        &self.operation.input.text
    }

    pub fn context_json(&self) -> Option<&serde_json::Value> {
        self.operation.input.context.as_ref()
    }

    /// Publish an intermediate progress update.
    pub fn report(&self, percent: u8, step: &str, message: &str) {
        self.reporter.report(percent, step, message);
    }

    /// Run the completion call, bounded by the configured timeout.
    /// An elapsed timeout is a provider failure, never left open.
    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        match tokio::time::timeout(self.provider_timeout, self.provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(format!(
                "provider call exceeded {:?}",
                self.provider_timeout
            ))),
        }
    }
}

/// What a processor hands back to the scheduler on success.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub payload: serde_json::Value,
    pub confidence: Option<f32>,
    pub model: String,
    pub usage: Usage,
}

impl ProcessOutcome {
    pub fn new(payload: serde_json::Value, response: &CompletionResponse) -> Self {
        Self {
            payload,
            confidence: None,
            model: response.model.clone(),
            usage: response.usage.clone(),
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// Kind-specific execution: builds the prompt, publishes intermediate
/// progress, calls the provider, and parses the response.
#[async_trait]
pub trait OperationProcessor: Send + Sync {
    fn kind(&self) -> OperationKind;

    async fn process(&self, ctx: &ProcessContext) -> Result<ProcessOutcome, Error>;
}
