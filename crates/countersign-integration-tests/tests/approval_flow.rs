//! End-to-end approval scenarios through the host runtime.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Harness;
use countersign_core::{
    ApprovalDecision, Choice, ExecutionStatus, HostError, StepError, TransportError, UserId,
};
use countersign_host::{InMemoryHost, RuntimeError};
use countersign_step::{ApprovalWorkflowStep, ReviewerSource, StepSettings};
use countersign_test::{MockTransport, expense_inputs, reviewer};
use serde_json::json;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn approve_completes_with_requester_as_reviewer() {
    let harness = Harness::with_defaults();

    let execution_id = harness.handle.invoke(expense_inputs()).await.unwrap();
    let posted = harness.transport.posted();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].channel.as_str(), "C1");
    assert!(posted[0].action("approve_request").is_some());
    assert!(posted[0].action("deny_request").is_some());

    let started = Instant::now();
    let decision = harness
        .handle
        .click(execution_id, "approve_request", reviewer())
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert_eq!(
        decision,
        ApprovalDecision::new(Choice::Approve, UserId::new("U1"))
    );

    let host = harness.shutdown().await;
    let execution = host.get(&execution_id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.outputs, Some(decision));
}

#[tokio::test(start_paused = true)]
async fn deny_completes_with_approved_false() {
    let harness = Harness::with_defaults();
    let execution_id = harness.handle.invoke(expense_inputs()).await.unwrap();

    let decision = harness
        .handle
        .click(execution_id, "deny_request", reviewer())
        .await
        .unwrap();
    assert!(!decision.approved);
    assert_eq!(decision.reviewer, UserId::new("U1"));
    assert!(decision.comments.is_none());

    let host = harness.shutdown().await;
    assert_eq!(
        host.get(&execution_id).await.unwrap().status,
        ExecutionStatus::Completed
    );
}

#[tokio::test]
async fn execution_stays_pending_after_start() {
    let harness = Harness::immediate();
    let execution_id = harness.handle.invoke(expense_inputs()).await.unwrap();

    let execution = harness.host.get(&execution_id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Pending);
    assert!(execution.outputs.is_none());
    assert!(execution.message_id.is_some());
    assert_eq!(harness.host.pending_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn completion_waits_for_settling_delay() {
    let harness = Harness::with_defaults();
    let execution_id = harness.handle.invoke(expense_inputs()).await.unwrap();
    harness
        .handle
        .click_detached(execution_id, "approve_request", reviewer())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(harness.host.get(&execution_id).await.unwrap().is_pending());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        harness.host.get(&execution_id).await.unwrap().status,
        ExecutionStatus::Completed
    );
}

#[tokio::test]
async fn failed_delivery_creates_no_decision() {
    let transport =
        MockTransport::new().with_failure(TransportError::Rejected("channel_not_found".into()));
    let harness = Harness::with_transport(transport, StepSettings::default());

    let err = harness.handle.invoke(expense_inputs()).await.unwrap_err();
    let execution_id = match err {
        RuntimeError::Step {
            execution_id,
            source: StepError::Delivery(detail),
        } => {
            assert!(detail.contains("channel_not_found"));
            execution_id
        },
        other => panic!("expected delivery error, got {other:?}"),
    };

    let execution = harness.host.get(&execution_id).await.unwrap();
    assert!(execution.is_pending());
    assert!(execution.outputs.is_none());
    assert!(execution.message_id.is_none());
    assert_eq!(harness.transport.post_count(), 0);
}

#[tokio::test]
async fn click_after_failed_delivery_is_rejected() {
    let transport =
        MockTransport::new().with_failure(TransportError::Unavailable("timeout".into()));
    let harness = Harness::with_transport(transport, StepSettings::default());

    let Err(RuntimeError::Step { execution_id, .. }) =
        harness.handle.invoke(expense_inputs()).await
    else {
        panic!("expected start to fail");
    };

    let err = harness
        .handle
        .click(execution_id, "approve_request", reviewer())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Host(HostError::NotAwaitingDecision(id)) if id == execution_id
    ));

    let host = harness.shutdown().await;
    let execution = host.get(&execution_id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Pending);
    assert!(execution.outputs.is_none());
    assert!(execution.finished_at.is_none());
}

#[tokio::test]
async fn actor_reviewer_source_reports_clicking_user() {
    let harness = Harness::start(
        StepSettings::default()
            .with_settling_delay(Duration::ZERO)
            .with_reviewer(ReviewerSource::Actor),
    );
    let execution_id = harness.handle.invoke(expense_inputs()).await.unwrap();

    let decision = harness
        .handle
        .click(execution_id, "approve_request", reviewer())
        .await
        .unwrap();
    assert_eq!(decision.reviewer, reviewer());
}

#[tokio::test]
async fn missing_inputs_rejected_before_step_runs() {
    let harness = Harness::immediate();

    let err = harness
        .handle
        .invoke(json!({
            "requester_id": "U1",
            "approval_channel_id": "C1",
            "details": "no subject"
        }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Host(HostError::InvalidInputs { ref field, .. }) if field == "subject"
    ));
    assert_eq!(harness.transport.post_count(), 0);
    assert!(harness.host.list().await.is_empty());
}

#[tokio::test]
async fn bad_target_date_rejected() {
    let harness = Harness::immediate();
    let mut inputs = expense_inputs();
    inputs["target_date"] = json!("31/12/2024");

    let err = harness.handle.invoke(inputs).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Host(HostError::InvalidInputs { ref field, .. }) if field == "target_date"
    ));
}

#[tokio::test(start_paused = true)]
async fn racing_clicks_complete_once() {
    let harness = Harness::with_defaults();
    let execution_id = harness.handle.invoke(expense_inputs()).await.unwrap();

    let (first, second) = tokio::join!(
        harness
            .handle
            .click(execution_id, "approve_request", reviewer()),
        harness
            .handle
            .click(execution_id, "deny_request", UserId::new("U3")),
    );

    let results = [first, second];
    let completed = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(completed, 1);
    let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(
        failure.step_error(),
        Some(StepError::Completion(_))
    ));

    let host = harness.shutdown().await;
    let execution = host.get(&execution_id).await.unwrap();
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert!(execution.last_step_error.is_none());
}

#[tokio::test]
async fn second_completion_fails() {
    let host = InMemoryHost::new();
    let execution = host.begin_execution(&expense_inputs()).await.unwrap();
    let step = ApprovalWorkflowStep::new(Arc::new(MockTransport::new()), Arc::new(host.clone()));
    let decision = ApprovalDecision::new(Choice::Approve, UserId::new("U1"));

    step.complete(&execution.id, &decision).await.unwrap();
    let err = step.complete(&execution.id, &decision).await.unwrap_err();
    assert!(err.is_completion());
    assert_eq!(
        host.get(&execution.id).await.unwrap().outputs,
        Some(decision)
    );
}

#[tokio::test]
async fn unknown_button_leaves_execution_pending() {
    let harness = Harness::immediate();
    let execution_id = harness.handle.invoke(expense_inputs()).await.unwrap();

    let err = harness
        .handle
        .click(execution_id, "escalate_request", reviewer())
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::Dispatch(_)));
    assert!(harness.host.get(&execution_id).await.unwrap().is_pending());
}
