//! Execution records kept by the workflow host.
//!
//! A [`WorkflowExecution`] starts `Pending` and leaves that state exactly once,
//! either to `Completed` (with outputs) or to `Failed` (with a reason). Every
//! later transition attempt is rejected with [`HostError::AlreadyFinished`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HostError, HostResult};
use crate::ids::{ExecutionId, MessageId};
use crate::request::{ApprovalDecision, ApprovalRequest};

/// Lifecycle state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Waiting for a decision.
    Pending,
    /// Finished with outputs.
    Completed,
    /// Finished without outputs.
    Failed,
}

impl ExecutionStatus {
    /// Whether the status is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One running (or finished) instance of the approval step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    /// Unique execution identifier.
    pub id: ExecutionId,
    /// Callback id of the function this execution runs.
    pub callback_id: String,
    /// Validated invocation inputs.
    pub inputs: ApprovalRequest,
    /// Current lifecycle state.
    pub status: ExecutionStatus,
    /// Message posted by the step, once delivery succeeded.
    pub message_id: Option<MessageId>,
    /// Outputs reported on completion.
    pub outputs: Option<ApprovalDecision>,
    /// Reason given when the execution failed.
    pub failure: Option<String>,
    /// Last error the step reported while the execution was pending.
    pub last_step_error: Option<String>,
    /// When the execution was created.
    pub created_at: DateTime<Utc>,
    /// When the execution left the pending state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowExecution {
    /// Create a pending execution.
    #[must_use]
    pub fn new(callback_id: impl Into<String>, inputs: ApprovalRequest) -> Self {
        Self {
            id: ExecutionId::new(),
            callback_id: callback_id.into(),
            inputs,
            status: ExecutionStatus::Pending,
            message_id: None,
            outputs: None,
            failure: None,
            last_step_error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Whether the execution is still waiting for a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ExecutionStatus::Pending
    }

    /// Transition `Pending -> Completed`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::AlreadyFinished`] if the execution is not pending.
    pub fn complete(&mut self, outputs: ApprovalDecision) -> HostResult<()> {
        self.ensure_pending()?;
        self.status = ExecutionStatus::Completed;
        self.outputs = Some(outputs);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Transition `Pending -> Failed`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::AlreadyFinished`] if the execution is not pending.
    pub fn fail(&mut self, reason: impl Into<String>) -> HostResult<()> {
        self.ensure_pending()?;
        self.status = ExecutionStatus::Failed;
        self.failure = Some(reason.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn ensure_pending(&self) -> HostResult<()> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(HostError::AlreadyFinished {
                execution_id: self.id,
                status: self.status,
            })
        }
    }
}
