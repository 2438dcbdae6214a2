//! Countersign Step - The approval workflow step.
//!
//! [`ApprovalWorkflowStep`] posts an approval request with two actions,
//! leaves the execution open, and when one action is clicked waits a settling
//! delay before reporting the decision to the host. [`ActionRouter`] is the
//! handler map the host dispatches clicks through.
//!
//! # Lifecycle
//!
//! ```text
//! Created --start--> AwaitingDecision --click--> Settling --complete--> Completed
//! ```
//!
//! The step keeps no state between calls: every event carries the
//! invocation inputs, and execution state lives in the host.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod event;
pub mod router;
pub mod settings;
pub mod step;

pub use event::{ActionEvent, DecisionEvent, Invocation, StartOutcome};
pub use router::{ActionHandler, ActionRouter, DispatchError};
pub use settings::{DEFAULT_SETTLING_DELAY, ReviewerSource, StepSettings};
pub use step::ApprovalWorkflowStep;
