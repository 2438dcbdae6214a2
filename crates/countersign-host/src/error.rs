use countersign_core::{ExecutionId, HostError, StepError};
use countersign_step::DispatchError;

/// Errors surfaced to callers of a [`HostHandle`](crate::HostHandle).
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// The host refused the request.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The step failed while running an execution.
    #[error("execution {execution_id}: {source}")]
    Step {
        /// Execution the step was running.
        execution_id: ExecutionId,
        /// What went wrong.
        #[source]
        source: StepError,
    },

    /// The click could not be routed or handled.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RuntimeError {
    /// The step error, if this is one.
    #[must_use]
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            Self::Step { source, .. } | Self::Dispatch(DispatchError::Step(source)) => Some(source),
            _ => None,
        }
    }
}
