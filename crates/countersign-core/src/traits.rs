//! Collaborator traits: the seams between the step and the platform.
//!
//! The step never talks to a chat platform directly. It posts through a
//! [`MessageTransport`] and reports completion through a [`WorkflowHost`];
//! platform adapters, the in-memory host and test mocks implement these.

use async_trait::async_trait;

use crate::error::{HostResult, TransportError};
use crate::ids::{ExecutionId, MessageId};
use crate::message::ApprovalMessage;
use crate::request::ApprovalDecision;

/// Delivers approval messages to a channel.
///
/// # Example
///
/// ```rust,ignore
/// use countersign_core::{ApprovalMessage, MessageId, MessageTransport, TransportError};
///
/// struct StdoutTransport;
///
/// #[async_trait::async_trait]
/// impl MessageTransport for StdoutTransport {
///     async fn post_message(&self, message: &ApprovalMessage) -> Result<MessageId, TransportError> {
///         println!("[{}] {}", message.channel, message.text);
///         Ok(MessageId::new("stdout-1"))
///     }
/// }
/// ```
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Post a message and return the platform's message identifier.
    async fn post_message(&self, message: &ApprovalMessage) -> Result<MessageId, TransportError>;
}

/// Accepts the terminal report of an execution.
#[async_trait]
pub trait WorkflowHost: Send + Sync {
    /// Complete an execution successfully with the given outputs.
    ///
    /// Hosts must accept at most one completion per execution; later
    /// attempts fail with [`HostError::AlreadyFinished`](crate::HostError).
    async fn complete_success(
        &self,
        execution_id: &ExecutionId,
        outputs: &ApprovalDecision,
    ) -> HostResult<()>;
}
