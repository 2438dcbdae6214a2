//! The approval message handed to the transport.
//!
//! This is a description of *what* to post, not how it looks: rendering into
//! a platform's block format is the transport's business.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::ids::ChannelId;
use crate::request::{ApprovalRequest, Choice};

/// Block id grouping the two approval actions.
pub const APPROVAL_BLOCK_ID: &str = "approval-actions";

/// Visual emphasis hint for a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    /// Affirmative action.
    Primary,
    /// Destructive or negative action.
    Danger,
}

/// One clickable action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionButton {
    /// Button label.
    pub label: String,
    /// Identifier delivered back to the host on click.
    pub action_id: String,
    /// Emphasis hint.
    pub style: ButtonStyle,
}

impl ActionButton {
    /// The button for a choice.
    #[must_use]
    pub fn for_choice(choice: Choice) -> Self {
        let (label, style) = match choice {
            Choice::Approve => ("Approve", ButtonStyle::Primary),
            Choice::Deny => ("Deny", ButtonStyle::Danger),
        };
        Self {
            label: label.to_string(),
            action_id: choice.action_id().to_string(),
            style,
        }
    }
}

/// An approval request message with its two actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalMessage {
    /// Destination channel.
    pub channel: ChannelId,
    /// Block id grouping the actions.
    pub block_id: String,
    /// Plain-text summary of the request.
    pub text: String,
    /// Approve first, deny second.
    pub actions: Vec<ActionButton>,
}

impl ApprovalMessage {
    /// Compose the message for a request.
    #[must_use]
    pub fn for_request(request: &ApprovalRequest) -> Self {
        let mut text = format!(
            "Approval requested by {}\n{}\n{}",
            request.requester_id, request.subject, request.details
        );
        if let Some(date) = request.target_date {
            let _ = write!(text, "\nTarget date: {date}");
        }

        Self {
            channel: request.approval_channel_id.clone(),
            block_id: APPROVAL_BLOCK_ID.to_string(),
            text,
            actions: vec![
                ActionButton::for_choice(Choice::Approve),
                ActionButton::for_choice(Choice::Deny),
            ],
        }
    }

    /// Find an action by identifier.
    #[must_use]
    pub fn action(&self, action_id: &str) -> Option<&ActionButton> {
        self.actions.iter().find(|a| a.action_id == action_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_message_targets_approval_channel() {
        let request = ApprovalRequest::new("U1", "C1", "Expense", "$50 lunch");
        let message = ApprovalMessage::for_request(&request);

        assert_eq!(message.channel, ChannelId::new("C1"));
        assert_eq!(message.block_id, APPROVAL_BLOCK_ID);
        assert!(message.text.contains("Expense"));
        assert!(message.text.contains("$50 lunch"));
        assert!(!message.text.contains("Target date"));
    }

    #[test]
    fn test_message_has_two_exclusive_actions() {
        let request = ApprovalRequest::new("U1", "C1", "Expense", "$50 lunch");
        let message = ApprovalMessage::for_request(&request);

        assert_eq!(message.actions.len(), 2);
        let approve = message.action("approve_request").unwrap();
        assert_eq!(approve.label, "Approve");
        assert_eq!(approve.style, ButtonStyle::Primary);
        let deny = message.action("deny_request").unwrap();
        assert_eq!(deny.style, ButtonStyle::Danger);
        assert!(message.action("maybe").is_none());
    }

    #[test]
    fn test_message_mentions_target_date() {
        let request = ApprovalRequest::new("U1", "C1", "Offsite", "Team offsite")
            .with_target_date(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
        let message = ApprovalMessage::for_request(&request);
        assert!(message.text.ends_with("Target date: 2024-05-20"));
    }
}
