//! Test utilities shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;
use crate::operation::Usage;
use crate::provider::{CompletionProvider, CompletionRequest, CompletionResponse};

struct QueuedReply {
    result: Result<CompletionResponse, Error>,
    delay: Option<Duration>,
}

/// A mock provider that returns pre-configured responses.
pub struct MockProvider {
    replies: Mutex<Vec<QueuedReply>>,
    /// Captured requests (for assertion).
    pub captured_requests: Mutex<Vec<CompletionRequest>>,
    pub name: String,
    pub default_model: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            captured_requests: Mutex::new(Vec::new()),
            name: "mock".to_string(),
            default_model: None,
        }
    }

    /// Queue a response to be returned by the next complete() call.
    /// Responses are returned in FIFO order (first queued = first returned).
    pub fn queue_response(&self, content: &str) {
        self.queue_reply(Ok(Self::response(content)), None);
    }

    /// Queue a response that is held for `delay` before being returned,
    /// simulating a slow in-flight provider call.
    pub fn queue_response_with_delay(&self, content: &str, delay: Duration) {
        self.queue_reply(Ok(Self::response(content)), Some(delay));
    }

    /// Queue an error for the next complete() call.
    pub fn queue_error(&self, error: Error) {
        self.queue_reply(Err(error), None);
    }

    /// Get the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.captured_requests.lock().unwrap().len()
    }

    /// Get the last captured request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }

    fn queue_reply(&self, result: Result<CompletionResponse, Error>, delay: Option<Duration>) {
        self.replies.lock().unwrap().insert(0, QueuedReply { result, delay });
    }

    fn response(content: &str) -> CompletionResponse {
        CompletionResponse {
            text: content.to_string(),
            model: "mock-model".to_string(),
            usage: Usage::new(0, 0),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        self.captured_requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop();
        match reply {
            Some(reply) => {
                if let Some(delay) = reply.delay {
                    tokio::time::sleep(delay).await;
                }
                reply.result
            }
            None => Err(Error::Unknown("No mock response queued".to_string())),
        }
    }
}
