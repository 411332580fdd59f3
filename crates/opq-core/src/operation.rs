use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The category of an operation. Determines which processor runs it, its
/// default duration estimate, and its cache TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ContentAnalysis,
    RecommendationGeneration,
    Clustering,
    InsightSynthesis,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::ContentAnalysis => "content_analysis",
            OperationKind::RecommendationGeneration => "recommendation_generation",
            OperationKind::Clustering => "clustering",
            OperationKind::InsightSynthesis => "insight_synthesis",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content_analysis" => Ok(OperationKind::ContentAnalysis),
            "recommendation_generation" => Ok(OperationKind::RecommendationGeneration),
            "clustering" => Ok(OperationKind::Clustering),
            "insight_synthesis" => Ok(OperationKind::InsightSynthesis),
            other => Err(Error::unknown_kind(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Normal => write!(f, "normal"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// The payload an operation is asked to process. The queue treats this as a
/// black box; only the kind's processor interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationInput {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl OperationInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// A unit of AI work submitted once and processed at most once (modulo
/// cache hits).
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: String,
    pub kind: OperationKind,
    pub input: OperationInput,
    pub priority: Priority,
    /// Hint used only to compute the estimated-completion timestamp.
    pub estimated_duration: Option<Duration>,
}

impl Operation {
    pub fn new(id: impl Into<String>, kind: OperationKind, input: OperationInput) -> Self {
        Self {
            id: id.into(),
            kind,
            input,
            priority: Priority::Normal,
            estimated_duration: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_estimated_duration(mut self, duration: Duration) -> Self {
        self.estimated_duration = Some(duration);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl ProgressStatus {
    /// Terminal statuses are absorbing: no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressStatus::Completed | ProgressStatus::Failed | ProgressStatus::Cancelled
        )
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressStatus::Queued => write!(f, "queued"),
            ProgressStatus::Processing => write!(f, "processing"),
            ProgressStatus::Completed => write!(f, "completed"),
            ProgressStatus::Failed => write!(f, "failed"),
            ProgressStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Mutable, pollable projection of an operation's execution state.
///
/// Percent is monotonically non-decreasing while the operation is active;
/// the store's write path enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub operation_id: String,
    pub percent: u8,
    pub status: ProgressStatus,
    pub message: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
}

impl Progress {
    /// Initial progress record published at enqueue time.
    pub fn queued(operation_id: impl Into<String>, estimated_completion: DateTime<Utc>) -> Self {
        Self {
            operation_id: operation_id.into(),
            percent: 0,
            status: ProgressStatus::Queued,
            message: "queued".to_string(),
            started_at: Utc::now(),
            estimated_completion: Some(estimated_completion),
            current_step: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Token accounting reported by the completion provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Immutable output record of a successfully completed operation.
///
/// Exists iff the corresponding progress reached `completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub operation_id: String,
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub processing_ms: u64,
    pub model: String,
    pub usage: Usage,
    /// True when the payload was served from the result cache.
    pub cached: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            OperationKind::ContentAnalysis,
            OperationKind::RecommendationGeneration,
            OperationKind::Clustering,
            OperationKind::InsightSynthesis,
        ] {
            assert_eq!(OperationKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_kind_unknown() {
        let err = OperationKind::from_str("sentiment_analysis").unwrap_err();
        assert!(matches!(err, Error::UnknownKind(_)));
    }

    #[test]
    fn test_operation_builder() {
        let op = Operation::new(
            "op-1",
            OperationKind::ContentAnalysis,
            OperationInput::text("analyze this").with_context(serde_json::json!({"team": "core"})),
        )
        .with_priority(Priority::High)
        .with_estimated_duration(Duration::from_secs(20));

        assert_eq!(op.id, "op-1");
        assert_eq!(op.priority, Priority::High);
        assert_eq!(op.estimated_duration, Some(Duration::from_secs(20)));
        assert!(op.input.context.is_some());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!ProgressStatus::Queued.is_terminal());
        assert!(!ProgressStatus::Processing.is_terminal());
        assert!(ProgressStatus::Completed.is_terminal());
        assert!(ProgressStatus::Failed.is_terminal());
        assert!(ProgressStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_progress_queued() {
        let eta = Utc::now() + chrono::Duration::seconds(15);
        let progress = Progress::queued("op-1", eta);
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.status, ProgressStatus::Queued);
        assert_eq!(progress.estimated_completion, Some(eta));
    }

    #[test]
    fn test_usage_totals() {
        let usage = Usage::new(120, 40);
        assert_eq!(usage.total_tokens, 160);
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&ProgressStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }
}
