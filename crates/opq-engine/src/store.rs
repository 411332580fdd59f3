//! Short-lived map of operation id to current progress and final result.
//!
//! The store is the single write point for progress, so the lifecycle
//! invariants live here: terminal statuses are absorbing and percentages
//! never decrease.

use std::collections::HashMap;
use std::sync::RwLock;

use opq_core::{OperationResult, Progress, ProgressStatus};

struct Tracked {
    progress: Progress,
    result: Option<OperationResult>,
}

#[derive(Default)]
pub struct OperationStore {
    inner: RwLock<HashMap<String, Tracked>>,
}

impl OperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly enqueued operation.
    pub fn insert(&self, progress: Progress) {
        let mut inner = self.inner.write().unwrap();
        inner.insert(
            progress.operation_id.clone(),
            Tracked {
                progress,
                result: None,
            },
        );
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().unwrap().contains_key(id)
    }

    pub fn progress(&self, id: &str) -> Option<Progress> {
        self.inner.read().unwrap().get(id).map(|t| t.progress.clone())
    }

    pub fn result(&self, id: &str) -> Option<OperationResult> {
        self.inner.read().unwrap().get(id).and_then(|t| t.result.clone())
    }

    pub fn is_terminal(&self, id: &str) -> bool {
        self.inner
            .read()
            .unwrap()
            .get(id)
            .map(|t| t.progress.is_terminal())
            .unwrap_or(false)
    }

    /// Record an intermediate processing update. Returns the stored progress,
    /// or None when the id is unknown or already terminal. Percent is clamped
    /// so the recorded sequence never decreases.
    pub fn update_processing(
        &self,
        id: &str,
        percent: u8,
        step: &str,
        message: &str,
    ) -> Option<Progress> {
        let mut inner = self.inner.write().unwrap();
        let tracked = inner.get_mut(id)?;
        if tracked.progress.is_terminal() {
            return None;
        }
        tracked.progress.status = ProgressStatus::Processing;
        tracked.progress.percent = tracked.progress.percent.max(percent.min(100));
        tracked.progress.message = message.to_string();
        tracked.progress.current_step = Some(step.to_string());
        Some(tracked.progress.clone())
    }

    /// Transition to `completed` and store the result in one step, keeping
    /// the result-iff-completed invariant. None means the result was
    /// discarded (unknown id or already terminal, e.g. cancelled).
    pub fn complete(
        &self,
        id: &str,
        result: OperationResult,
        message: &str,
    ) -> Option<Progress> {
        let mut inner = self.inner.write().unwrap();
        let tracked = inner.get_mut(id)?;
        if tracked.progress.is_terminal() {
            return None;
        }
        tracked.progress.status = ProgressStatus::Completed;
        tracked.progress.percent = 100;
        tracked.progress.message = message.to_string();
        tracked.progress.current_step = None;
        tracked.result = Some(result);
        Some(tracked.progress.clone())
    }

    pub fn fail(&self, id: &str, message: &str) -> Option<Progress> {
        self.terminate(id, ProgressStatus::Failed, message)
    }

    pub fn cancel(&self, id: &str, message: &str) -> Option<Progress> {
        self.terminate(id, ProgressStatus::Cancelled, message)
    }

    fn terminate(&self, id: &str, status: ProgressStatus, message: &str) -> Option<Progress> {
        let mut inner = self.inner.write().unwrap();
        let tracked = inner.get_mut(id)?;
        if tracked.progress.is_terminal() {
            return None;
        }
        tracked.progress.status = status;
        tracked.progress.message = message.to_string();
        tracked.progress.current_step = None;
        Some(tracked.progress.clone())
    }

    /// Drop both records after the retention window.
    pub fn purge(&self, id: &str) {
        self.inner.write().unwrap().remove(id);
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
