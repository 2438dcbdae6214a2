//! Canned requests and inputs.

use countersign_core::{ApprovalRequest, UserId};
use serde_json::{Value, json};

/// The expense request used throughout the scenarios: U1 asks C1 to approve a $50 lunch.
#[must_use]
pub fn expense_request() -> ApprovalRequest {
    ApprovalRequest::new("U1", "C1", "Expense", "$50 lunch")
}

/// Raw invocation inputs for [`expense_request`], as a host receives them.
#[must_use]
pub fn expense_inputs() -> Value {
    json!({
        "requester_id": "U1",
        "approval_channel_id": "C1",
        "subject": "Expense",
        "details": "$50 lunch"
    })
}

/// A reviewer distinct from the requester.
#[must_use]
pub fn reviewer() -> UserId {
    UserId::new("U2")
}
