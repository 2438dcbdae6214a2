use crate::execution::ExecutionStatus;
use crate::ids::ExecutionId;

/// Errors reported by a [`MessageTransport`](crate::MessageTransport).
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The platform refused the message (bad channel, missing scope, ...).
    #[error("message rejected: {0}")]
    Rejected(String),

    /// The platform could not be reached.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by a [`WorkflowHost`](crate::WorkflowHost).
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    /// No execution with this id is known to the host.
    #[error("unknown execution: {0}")]
    UnknownExecution(ExecutionId),

    /// The execution already left the pending state.
    #[error("execution {execution_id} already {status}")]
    AlreadyFinished {
        /// The execution that was addressed.
        execution_id: ExecutionId,
        /// Its current, terminal status.
        status: ExecutionStatus,
    },

    /// The execution is pending but its approval message was never posted.
    #[error("execution {0} is not awaiting a decision")]
    NotAwaitingDecision(ExecutionId),

    /// Invocation inputs do not satisfy the input schema.
    #[error("invalid input '{field}': {message}")]
    InvalidInputs {
        /// Offending parameter.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Step outputs do not satisfy the output schema.
    #[error("invalid output '{field}': {message}")]
    InvalidOutputs {
        /// Offending parameter.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The host runtime stopped accepting events.
    #[error("host runtime shut down")]
    Shutdown,
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors surfaced by the approval step itself.
///
/// Neither kind is retried by the step.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StepError {
    /// Posting the approval message failed; the execution stays pending.
    #[error("failed to post approval message: {0}")]
    Delivery(String),

    /// The host rejected the completion report.
    #[error("failed to complete execution: {0}")]
    Completion(String),

    /// An action arrived that is not one of the step's two buttons.
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl StepError {
    /// Whether this is a delivery failure.
    #[must_use]
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery(_))
    }

    /// Whether this is a completion failure.
    #[must_use]
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::Completion(_))
    }
}

impl From<TransportError> for StepError {
    fn from(e: TransportError) -> Self {
        Self::Delivery(e.to_string())
    }
}

impl From<HostError> for StepError {
    fn from(e: HostError) -> Self {
        Self::Completion(e.to_string())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;
