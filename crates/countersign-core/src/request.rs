//! Approval request, choice and decision types.
//!
//! An [`ApprovalRequest`] is built from the step's invocation inputs and never
//! changes afterwards. An [`ApprovalDecision`] is built exactly once, when a
//! reviewer picks one of the two actions, and becomes the step's outputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ChannelId, UserId};

/// Action identifier of the "approve" button.
pub const APPROVE_ACTION_ID: &str = "approve_request";

/// Action identifier of the "deny" button.
pub const DENY_ACTION_ID: &str = "deny_request";

/// The inputs of one approval step invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Who is asking for approval.
    pub requester_id: UserId,
    /// Where the approval message is posted.
    pub approval_channel_id: ChannelId,
    /// Short subject line.
    pub subject: String,
    /// Free-form details for the reviewer.
    pub details: String,
    /// Optional date the request refers to (`YYYY-MM-DD` on the wire).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
}

impl ApprovalRequest {
    /// Create a new approval request without a target date.
    #[must_use]
    pub fn new(
        requester_id: impl Into<UserId>,
        approval_channel_id: impl Into<ChannelId>,
        subject: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            requester_id: requester_id.into(),
            approval_channel_id: approval_channel_id.into(),
            subject: subject.into(),
            details: details.into(),
            target_date: None,
        }
    }

    /// Set the target date.
    #[must_use]
    pub fn with_target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }
}

impl fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (requested by {} in {})",
            self.subject, self.requester_id, self.approval_channel_id
        )
    }
}

/// One of the two mutually exclusive actions offered to the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// The reviewer approved the request.
    Approve,
    /// The reviewer denied the request.
    Deny,
}

impl Choice {
    /// Map a button action identifier to a choice.
    ///
    /// Returns `None` for identifiers outside the approval surface.
    #[must_use]
    pub fn from_action_id(action_id: &str) -> Option<Self> {
        match action_id {
            APPROVE_ACTION_ID => Some(Self::Approve),
            DENY_ACTION_ID => Some(Self::Deny),
            _ => None,
        }
    }

    /// The button action identifier for this choice.
    #[must_use]
    pub fn action_id(self) -> &'static str {
        match self {
            Self::Approve => APPROVE_ACTION_ID,
            Self::Deny => DENY_ACTION_ID,
        }
    }

    /// Whether this choice approves the request.
    #[must_use]
    pub fn is_approve(self) -> bool {
        matches!(self, Self::Approve)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

/// The outputs of a finished approval step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    /// Whether the request was approved.
    pub approved: bool,
    /// Who is recorded as having reviewed the request.
    pub reviewer: UserId,
    /// Optional reviewer comments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl ApprovalDecision {
    /// Build the decision for a choice.
    #[must_use]
    pub fn new(choice: Choice, reviewer: UserId) -> Self {
        Self {
            approved: choice.is_approve(),
            reviewer,
            comments: None,
        }
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.approved { "approved" } else { "denied" };
        write!(f, "{verdict} by {}", self.reviewer)
    }
}
