//! The approval workflow step.
//!
//! # Flow
//!
//! 1. `start`: post the approval message; the execution stays open
//! 2. A reviewer clicks approve or deny; the host dispatches the click
//! 3. `on_decision`: build the decision, then wait the settling delay
//! 4. `complete`: report the decision to the host, exactly once
//!
//! Delivery and completion failures are surfaced to the caller and never
//! retried here.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use countersign_core::{
    APPROVE_ACTION_ID, ApprovalDecision, ApprovalMessage, DENY_ACTION_ID, ExecutionId,
    FunctionDefinition, MessageTransport, StepResult, WorkflowHost,
};

use crate::event::{ActionEvent, DecisionEvent, Invocation, StartOutcome};
use crate::router::{ActionHandler, ActionRouter};
use crate::settings::{ReviewerSource, StepSettings};

/// Posts approval requests and reports decisions.
///
/// # Example
///
/// ```rust,ignore
/// let step = Arc::new(ApprovalWorkflowStep::new(transport, host));
/// let mut router = ActionRouter::new();
/// step.register(&mut router);
///
/// let outcome = step.start(&Invocation::new(execution_id, request)).await?;
/// assert!(!outcome.completed);
/// ```
pub struct ApprovalWorkflowStep {
    transport: Arc<dyn MessageTransport>,
    host: Arc<dyn WorkflowHost>,
    settings: StepSettings,
}

impl ApprovalWorkflowStep {
    /// Create a step with default settings.
    #[must_use]
    pub fn new(transport: Arc<dyn MessageTransport>, host: Arc<dyn WorkflowHost>) -> Self {
        Self {
            transport,
            host,
            settings: StepSettings::default(),
        }
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: StepSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &StepSettings {
        &self.settings
    }

    /// The definition hosts register this step under.
    #[must_use]
    pub fn definition() -> FunctionDefinition {
        FunctionDefinition::approval()
    }

    /// Register this step for both approval actions.
    pub fn register(self: &Arc<Self>, router: &mut ActionRouter) {
        router.register_handler(
            &[APPROVE_ACTION_ID, DENY_ACTION_ID],
            Arc::clone(self) as Arc<dyn ActionHandler>,
        );
    }

    /// Post the approval request.
    ///
    /// On success the outcome reports `completed = false`; the execution
    /// finishes from the action handler.
    ///
    /// # Errors
    ///
    /// [`StepError::Delivery`](countersign_core::StepError::Delivery) if the
    /// transport fails. Nothing is recorded, so the call may be retried.
    pub async fn start(&self, invocation: &Invocation) -> StepResult<StartOutcome> {
        let request = &invocation.inputs;
        info!(
            execution_id = %invocation.execution_id,
            channel = %request.approval_channel_id,
            requester = %request.requester_id,
            "incoming approval request"
        );

        let message = ApprovalMessage::for_request(request);
        match self.transport.post_message(&message).await {
            Ok(message_id) => {
                info!(
                    execution_id = %invocation.execution_id,
                    message_id = %message_id,
                    "approval request posted, awaiting decision"
                );
                Ok(StartOutcome::awaiting_decision(message_id))
            },
            Err(e) => {
                warn!(
                    execution_id = %invocation.execution_id,
                    error = %e,
                    "failed to post approval request"
                );
                Err(e.into())
            },
        }
    }

    /// Turn a click into a decision, then wait the settling delay.
    pub async fn on_decision(&self, event: &DecisionEvent) -> ApprovalDecision {
        let reviewer = match self.settings.reviewer {
            ReviewerSource::Requester => event.inputs.requester_id.clone(),
            ReviewerSource::Actor => event.actor.clone(),
        };
        let decision = ApprovalDecision::new(event.choice, reviewer);
        info!(
            execution_id = %event.execution_id,
            choice = %event.choice,
            actor = %event.actor,
            "decision received"
        );

        let delay = self.settings.settling_delay;
        if !delay.is_zero() {
            debug!(
                execution_id = %event.execution_id,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "settling before completion"
            );
            tokio::time::sleep(delay).await;
        }
        decision
    }

    /// Report the decision to the host.
    ///
    /// # Errors
    ///
    /// [`StepError::Completion`](countersign_core::StepError::Completion) if
    /// the host rejects it, for instance because the execution was already
    /// completed.
    pub async fn complete(
        &self,
        execution_id: &ExecutionId,
        decision: &ApprovalDecision,
    ) -> StepResult<()> {
        if let Err(e) = self.host.complete_success(execution_id, decision).await {
            warn!(%execution_id, error = %e, "host rejected completion");
            return Err(e.into());
        }
        info!(%execution_id, approved = decision.approved, reviewer = %decision.reviewer, "execution completed");
        Ok(())
    }
}

#[async_trait]
impl ActionHandler for ApprovalWorkflowStep {
    async fn handle(&self, event: ActionEvent) -> StepResult<ApprovalDecision> {
        let event = DecisionEvent::try_from(event)?;
        let decision = self.on_decision(&event).await;
        self.complete(&event.execution_id, &decision).await?;
        Ok(decision)
    }
}

impl std::fmt::Debug for ApprovalWorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalWorkflowStep")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countersign_core::{Choice, HostError, StepError, TransportError, UserId};
    use countersign_test::{MockTransport, RecordingHost, expense_request, reviewer};
    use std::time::Duration;
    use tokio::time::Instant;

    fn make_step(transport: &MockTransport, host: &RecordingHost) -> ApprovalWorkflowStep {
        ApprovalWorkflowStep::new(Arc::new(transport.clone()), Arc::new(host.clone()))
    }

    fn decision_event(choice: Choice) -> DecisionEvent {
        DecisionEvent {
            execution_id: ExecutionId::new(),
            choice,
            actor: reviewer(),
            inputs: expense_request(),
        }
    }

    fn click(execution_id: ExecutionId, action_id: &str) -> ActionEvent {
        ActionEvent {
            execution_id,
            action_id: action_id.to_string(),
            actor: reviewer(),
            inputs: expense_request(),
        }
    }

    // -----------------------------------------------------------------------
    // start
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_start_posts_message_and_stays_open() {
        let transport = MockTransport::new();
        let host = RecordingHost::new();
        let step = make_step(&transport, &host);

        let invocation = Invocation::new(ExecutionId::new(), expense_request());
        let outcome = step.start(&invocation).await.unwrap();

        assert!(!outcome.completed);
        assert_eq!(outcome.message_id.as_str(), "msg-0");
        let posted = transport.posted();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].channel.as_str(), "C1");
        assert!(posted[0].action(APPROVE_ACTION_ID).is_some());
        assert!(posted[0].action(DENY_ACTION_ID).is_some());
        assert!(host.completions().is_empty());
    }

    #[tokio::test]
    async fn test_start_delivery_failure() {
        let transport = MockTransport::new()
            .with_failure(TransportError::Rejected("channel_not_found".to_string()));
        let host = RecordingHost::new();
        let step = make_step(&transport, &host);

        let invocation = Invocation::new(ExecutionId::new(), expense_request());
        let err = step.start(&invocation).await.unwrap_err();
        assert!(err.is_delivery());
        assert!(err.to_string().contains("channel_not_found"));
        assert_eq!(transport.post_count(), 0);
        assert!(host.completions().is_empty());

        // Retry succeeds once the transport recovers.
        let outcome = step.start(&invocation).await.unwrap();
        assert!(!outcome.completed);
    }

    // -----------------------------------------------------------------------
    // on_decision
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_decision_maps_choice_and_settles() {
        let step = make_step(&MockTransport::new(), &RecordingHost::new());

        let started = Instant::now();
        let approved = step.on_decision(&decision_event(Choice::Approve)).await;
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(approved.approved);
        assert_eq!(approved.reviewer, UserId::new("U1"));
        assert!(approved.comments.is_none());

        let denied = step.on_decision(&decision_event(Choice::Deny)).await;
        assert!(!denied.approved);
        assert_eq!(denied.reviewer, UserId::new("U1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reviewer_from_actor() {
        let step = make_step(&MockTransport::new(), &RecordingHost::new()).with_settings(
            StepSettings::default()
                .with_reviewer(ReviewerSource::Actor)
                .with_settling_delay(Duration::from_millis(250)),
        );

        let started = Instant::now();
        let decision = step.on_decision(&decision_event(Choice::Approve)).await;
        assert_eq!(decision.reviewer, reviewer());
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    // -----------------------------------------------------------------------
    // complete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_complete_twice_fails() {
        let host = RecordingHost::new();
        let step = make_step(&MockTransport::new(), &host);
        let execution_id = ExecutionId::new();
        let decision = ApprovalDecision::new(Choice::Approve, UserId::new("U1"));

        step.complete(&execution_id, &decision).await.unwrap();
        let err = step.complete(&execution_id, &decision).await.unwrap_err();
        assert!(err.is_completion());
        assert_eq!(host.completions().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_rejected_by_host() {
        let execution_id = ExecutionId::new();
        let host = RecordingHost::new().rejecting(HostError::UnknownExecution(execution_id));
        let step = make_step(&MockTransport::new(), &host);
        let decision = ApprovalDecision::new(Choice::Deny, UserId::new("U1"));

        let err = step.complete(&execution_id, &decision).await.unwrap_err();
        assert!(matches!(err, StepError::Completion(ref msg) if msg.contains("unknown execution")));
    }

    // -----------------------------------------------------------------------
    // handler
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_registered_handler_completes_execution() {
        let host = RecordingHost::new();
        let step = Arc::new(make_step(&MockTransport::new(), &host));
        let mut router = ActionRouter::new();
        step.register(&mut router);
        assert!(router.handles(APPROVE_ACTION_ID));
        assert!(router.handles(DENY_ACTION_ID));

        let execution_id = ExecutionId::new();
        let decision = router
            .dispatch(click(execution_id, DENY_ACTION_ID))
            .await
            .unwrap();
        assert!(!decision.approved);
        assert_eq!(host.completion_for(&execution_id), Some(decision));
    }

    #[tokio::test(start_paused = true)]
    async fn test_racing_clicks_complete_once() {
        let host = RecordingHost::new();
        let step = make_step(&MockTransport::new(), &host);
        let execution_id = ExecutionId::new();

        let (first, second) = tokio::join!(
            step.handle(click(execution_id, APPROVE_ACTION_ID)),
            step.handle(click(execution_id, DENY_ACTION_ID)),
        );
        let failures = [&first, &second].iter().filter(|r| r.is_err()).count();
        assert_eq!(failures, 1);
        assert_eq!(host.completions().len(), 1);
    }

    #[tokio::test]
    async fn test_handler_rejects_unknown_action() {
        let host = RecordingHost::new();
        let step = make_step(&MockTransport::new(), &host);
        let err = step
            .handle(click(ExecutionId::new(), "maybe_request"))
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::UnknownAction(_)));
        assert!(host.completions().is_empty());
    }

    #[test]
    fn test_definition_and_debug() {
        assert_eq!(ApprovalWorkflowStep::definition().callback_id, "approval");
        let step = make_step(&MockTransport::new(), &RecordingHost::new());
        assert!(format!("{step:?}").contains("ApprovalWorkflowStep"));
    }
}
