//! Countersign Core - Shared types for the approval workflow step.
//!
//! This crate holds everything the step and its host have to agree on:
//!
//! - **Identifiers**: [`UserId`], [`ChannelId`], [`MessageId`], [`ExecutionId`]
//! - **Data model**: [`ApprovalRequest`], [`ApprovalDecision`], [`Choice`],
//!   [`WorkflowExecution`], [`ExecutionStatus`]
//! - **Function definition**: [`FunctionDefinition`] with the input and output
//!   parameter schemas the host enforces
//! - **Approval message**: [`ApprovalMessage`], the platform-neutral description
//!   of the request and its two actions
//! - **Collaborators**: [`MessageTransport`] and [`WorkflowHost`]
//!
//! # Example
//!
//! ```
//! use countersign_core::{ApprovalDecision, ApprovalRequest, Choice, UserId};
//!
//! let request = ApprovalRequest::new("U1", "C1", "Expense", "$50 lunch");
//!
//! let choice = Choice::from_action_id("approve_request").unwrap();
//! let decision = ApprovalDecision::new(choice, request.requester_id.clone());
//!
//! assert!(decision.approved);
//! assert_eq!(decision.reviewer, UserId::new("U1"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod definition;
/// Error types shared by the step, its transport and its host.
pub mod error;
pub mod execution;
pub mod ids;
pub mod message;
pub mod request;
pub mod traits;

pub use definition::{
    APPROVAL_CALLBACK_ID, FunctionDefinition, Parameter, ParameterSchema, ParameterType,
    SchemaViolation,
};
pub use error::{HostError, HostResult, StepError, StepResult, TransportError};
pub use execution::{ExecutionStatus, WorkflowExecution};
pub use ids::{ChannelId, ExecutionId, MessageId, UserId};
pub use message::{APPROVAL_BLOCK_ID, ActionButton, ApprovalMessage, ButtonStyle};
pub use request::{
    APPROVE_ACTION_ID, ApprovalDecision, ApprovalRequest, Choice, DENY_ACTION_ID,
};
pub use traits::{MessageTransport, WorkflowHost};
