//! Mock implementations for testing.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use countersign_core::{
    ApprovalDecision, ApprovalMessage, ExecutionId, ExecutionStatus, HostError, HostResult,
    MessageId, MessageTransport, TransportError, WorkflowHost,
};

/// Mock [`MessageTransport`] that records every posted message.
///
/// Failures can be queued; each queued failure is returned by one
/// `post_message` call before the transport goes back to succeeding.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    posted: Arc<Mutex<Vec<ApprovalMessage>>>,
    failures: Arc<Mutex<VecDeque<TransportError>>>,
    next_id: Arc<AtomicU64>,
}

impl MockTransport {
    /// Create a transport that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next post.
    #[must_use]
    pub fn with_failure(self, error: TransportError) -> Self {
        if let Ok(mut guard) = self.failures.lock() {
            guard.push_back(error);
        }
        self
    }

    /// Messages posted so far.
    #[must_use]
    pub fn posted(&self) -> Vec<ApprovalMessage> {
        self.posted.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of messages posted so far.
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.posted.lock().map(|g| g.len()).unwrap_or_default()
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn post_message(&self, message: &ApprovalMessage) -> Result<MessageId, TransportError> {
        let failure = self.failures.lock().ok().and_then(|mut g| g.pop_front());
        if let Some(error) = failure {
            return Err(error);
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.posted.lock() {
            guard.push(message.clone());
        }
        Ok(MessageId::new(format!("msg-{n}")))
    }
}

/// Mock [`WorkflowHost`] that records completions and rejects duplicates.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    completions: Arc<Mutex<Vec<(ExecutionId, ApprovalDecision)>>>,
    completed: Arc<Mutex<HashSet<ExecutionId>>>,
    rejection: Arc<Mutex<Option<HostError>>>,
}

impl RecordingHost {
    /// Create a host that accepts one completion per execution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every completion fail with `error`.
    #[must_use]
    pub fn rejecting(self, error: HostError) -> Self {
        if let Ok(mut guard) = self.rejection.lock() {
            *guard = Some(error);
        }
        self
    }

    /// Accepted completions, in order.
    #[must_use]
    pub fn completions(&self) -> Vec<(ExecutionId, ApprovalDecision)> {
        self.completions.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Accepted completion for one execution, if any.
    #[must_use]
    pub fn completion_for(&self, execution_id: &ExecutionId) -> Option<ApprovalDecision> {
        self.completions()
            .into_iter()
            .find(|(id, _)| id == execution_id)
            .map(|(_, decision)| decision)
    }
}

#[async_trait]
impl WorkflowHost for RecordingHost {
    async fn complete_success(
        &self,
        execution_id: &ExecutionId,
        outputs: &ApprovalDecision,
    ) -> HostResult<()> {
        if let Some(error) = self.rejection.lock().ok().and_then(|g| g.clone()) {
            return Err(error);
        }

        let mut completed = self
            .completed
            .lock()
            .map_err(|_| HostError::Shutdown)?;
        if !completed.insert(*execution_id) {
            return Err(HostError::AlreadyFinished {
                execution_id: *execution_id,
                status: ExecutionStatus::Completed,
            });
        }
        if let Ok(mut guard) = self.completions.lock() {
            guard.push((*execution_id, outputs.clone()));
        }
        Ok(())
    }
}
