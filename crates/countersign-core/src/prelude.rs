//! Prelude module - commonly used types for convenient import.
//!
//! Use `use countersign_core::prelude::*;` to import all essential types.

// Identifiers
pub use crate::{ChannelId, ExecutionId, MessageId, UserId};

// Data model
pub use crate::{ApprovalDecision, ApprovalRequest, Choice, ExecutionStatus, WorkflowExecution};

// Definition and message
pub use crate::{ApprovalMessage, FunctionDefinition};

// Collaborators
pub use crate::{MessageTransport, WorkflowHost};

// Errors
pub use crate::{HostError, HostResult, StepError, StepResult, TransportError};
