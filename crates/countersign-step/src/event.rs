//! Inbound calls and events the host delivers to the step.

use serde::{Deserialize, Serialize};

use countersign_core::{
    ApprovalRequest, Choice, ExecutionId, MessageId, StepError, UserId,
};

/// The initial call for an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    /// Execution being started.
    pub execution_id: ExecutionId,
    /// Validated inputs.
    pub inputs: ApprovalRequest,
}

impl Invocation {
    /// Create an invocation.
    #[must_use]
    pub fn new(execution_id: ExecutionId, inputs: ApprovalRequest) -> Self {
        Self {
            execution_id,
            inputs,
        }
    }
}

/// Result of a successful `start`.
///
/// `completed` is always `false`: the step finishes later, from the action
/// handler, and the host must not treat the initial call as completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartOutcome {
    /// The posted approval message.
    pub message_id: MessageId,
    /// Whether the step finished with this call.
    pub completed: bool,
}

impl StartOutcome {
    pub(crate) fn awaiting_decision(message_id: MessageId) -> Self {
        Self {
            message_id,
            completed: false,
        }
    }
}

/// A raw button click as delivered by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
    /// Execution the clicked message belongs to.
    pub execution_id: ExecutionId,
    /// Identifier of the clicked action.
    pub action_id: String,
    /// User who clicked.
    pub actor: UserId,
    /// The execution's original inputs.
    pub inputs: ApprovalRequest,
}

/// A click resolved to one of the step's two choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// Execution being decided.
    pub execution_id: ExecutionId,
    /// Selected choice.
    pub choice: Choice,
    /// User who clicked.
    pub actor: UserId,
    /// The execution's original inputs.
    pub inputs: ApprovalRequest,
}

impl TryFrom<ActionEvent> for DecisionEvent {
    type Error = StepError;

    fn try_from(event: ActionEvent) -> Result<Self, Self::Error> {
        let choice = Choice::from_action_id(&event.action_id)
            .ok_or(StepError::UnknownAction(event.action_id))?;
        Ok(Self {
            execution_id: event.execution_id,
            choice,
            actor: event.actor,
            inputs: event.inputs,
        })
    }
}
