//! opq-processors: Operation processors for opq
//!
//! One module per operation kind. Each processor owns its prompt template
//! and response parsing; registering it with the engine binds the kind's
//! default duration and cache TTL. Adding a kind means adding a module here
//! and registering it; queue logic never changes.

use std::sync::Arc;
use std::time::Duration;

use opq_core::{KindProfile, OperationProcessor};

mod clustering;
mod content_analysis;
mod insights;
pub mod prompt;
mod recommendations;

pub use clustering::ClusteringProcessor;
pub use content_analysis::ContentAnalysisProcessor;
pub use insights::InsightSynthesisProcessor;
pub use recommendations::RecommendationProcessor;

/// The built-in processors with their scheduling and caching defaults.
///
/// Recommendation generation is expensive and stable, so it caches longest;
/// clustering output shifts whenever the underlying items do, so it expires
/// quickly.
pub fn builtin() -> Vec<(Arc<dyn OperationProcessor>, KindProfile)> {
    vec![
        (
            Arc::new(ContentAnalysisProcessor::new()),
            KindProfile::new(Duration::from_secs(15), Duration::from_secs(15 * 60)),
        ),
        (
            Arc::new(RecommendationProcessor::new()),
            KindProfile::new(Duration::from_secs(30), Duration::from_secs(60 * 60)),
        ),
        (
            Arc::new(ClusteringProcessor::new()),
            KindProfile::new(Duration::from_secs(45), Duration::from_secs(5 * 60)),
        ),
        (
            Arc::new(InsightSynthesisProcessor::new()),
            KindProfile::new(Duration::from_secs(25), Duration::from_secs(30 * 60)),
        ),
    ]
}

#[cfg(test)]
pub(crate) mod tests_support {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use opq_core::testing::MockProvider;
    use opq_core::{
        CompletionProvider, Error, Operation, OperationProcessor, ProcessContext, ProcessOutcome,
        ProgressReporter,
    };

    pub struct RecordingReporter {
        events: Mutex<Vec<(u8, String)>>,
    }

    impl RecordingReporter {
        pub fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        pub fn percents(&self) -> Vec<u8> {
            self.events.lock().unwrap().iter().map(|(p, _)| *p).collect()
        }
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, percent: u8, step: &str, _message: &str) {
            self.events.lock().unwrap().push((percent, step.to_string()));
        }
    }

    pub async fn run_processor(
        processor: &dyn OperationProcessor,
        operation: Operation,
        provider: &Arc<MockProvider>,
        reporter: &Arc<RecordingReporter>,
    ) -> Result<ProcessOutcome, Error> {
        let ctx = ProcessContext::new(
            operation,
            provider.clone() as Arc<dyn CompletionProvider>,
            reporter.clone() as Arc<dyn ProgressReporter>,
            Duration::from_secs(5),
        );
        processor.process(&ctx).await
    }
}
