//! Host runtime: the inbound event queue.
//!
//! Platform adapters (or the CLI simulator) push [`HostEvent`]s through a
//! [`HostHandle`]. The runtime loop creates executions, runs the step's
//! `start`, and dispatches clicks through the [`ActionRouter`]. Each click is
//! handled on its own task so a settling delay never stalls the queue.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use countersign_core::{
    ApprovalDecision, ExecutionId, HostError, MessageId, MessageTransport, UserId,
};
use countersign_step::{
    ActionEvent, ActionRouter, ApprovalWorkflowStep, Invocation, StepSettings,
};

use crate::error::RuntimeError;
use crate::memory::InMemoryHost;

/// Default depth of the inbound event queue.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// An inbound event for the runtime.
#[derive(Debug)]
pub enum HostEvent {
    /// Create an execution from raw inputs and start the step.
    Invoke {
        /// Raw invocation inputs.
        inputs: Value,
        /// Receives the execution id, or why it could not be started.
        reply: oneshot::Sender<Result<ExecutionId, RuntimeError>>,
    },
    /// Run `start` again for a pending execution whose delivery failed.
    Restart {
        /// Execution to restart.
        execution_id: ExecutionId,
        /// Receives the posted message id.
        reply: oneshot::Sender<Result<MessageId, RuntimeError>>,
    },
    /// A reviewer clicked one of the actions.
    Action {
        /// Execution the clicked message belongs to.
        execution_id: ExecutionId,
        /// Clicked action identifier.
        action_id: String,
        /// Clicking user.
        actor: UserId,
        /// Receives the decision once the execution completes.
        reply: Option<oneshot::Sender<Result<ApprovalDecision, RuntimeError>>>,
    },
}

/// Cloneable sender side of the runtime.
///
/// The loop stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct HostHandle {
    tx: mpsc::Sender<HostEvent>,
}

impl HostHandle {
    /// Invoke the step with raw inputs.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Host`] for invalid inputs or a stopped runtime,
    /// [`RuntimeError::Step`] if the approval message could not be posted.
    /// In the latter case the execution exists and stays pending.
    pub async fn invoke(&self, inputs: Value) -> Result<ExecutionId, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(HostEvent::Invoke { inputs, reply }).await?;
        rx.await.map_err(|_| HostError::Shutdown)?
    }

    /// Retry `start` for a pending execution.
    ///
    /// # Errors
    ///
    /// As for [`invoke`](Self::invoke), plus [`HostError::AlreadyFinished`]
    /// if the execution is no longer pending.
    pub async fn restart(&self, execution_id: ExecutionId) -> Result<MessageId, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(HostEvent::Restart {
            execution_id,
            reply,
        })
        .await?;
        rx.await.map_err(|_| HostError::Shutdown)?
    }

    /// Deliver a click and wait for the resulting decision.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Dispatch`] if the action is unknown or the host
    /// rejected the completion.
    pub async fn click(
        &self,
        execution_id: ExecutionId,
        action_id: impl Into<String>,
        actor: UserId,
    ) -> Result<ApprovalDecision, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(HostEvent::Action {
            execution_id,
            action_id: action_id.into(),
            actor,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| HostError::Shutdown)?
    }

    /// Deliver a click without waiting for the outcome.
    ///
    /// # Errors
    ///
    /// [`HostError::Shutdown`] if the runtime stopped.
    pub async fn click_detached(
        &self,
        execution_id: ExecutionId,
        action_id: impl Into<String>,
        actor: UserId,
    ) -> Result<(), RuntimeError> {
        self.send(HostEvent::Action {
            execution_id,
            action_id: action_id.into(),
            actor,
            reply: None,
        })
        .await
    }

    async fn send(&self, event: HostEvent) -> Result<(), RuntimeError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::Host(HostError::Shutdown))
    }
}

/// The event loop connecting a host, the step and its router.
pub struct HostRuntime {
    host: InMemoryHost,
    step: Arc<ApprovalWorkflowStep>,
    router: Arc<ActionRouter>,
    events: mpsc::Receiver<HostEvent>,
    tasks: JoinSet<()>,
}

impl HostRuntime {
    /// Wire the step to `host` and `transport` and create the event queue.
    ///
    /// The step reports completions to `host`. `buffer` is the queue depth
    /// and is raised to 1 if zero.
    #[must_use]
    pub fn new(
        host: InMemoryHost,
        transport: Arc<dyn MessageTransport>,
        settings: StepSettings,
        buffer: usize,
    ) -> (Self, HostHandle) {
        let step = Arc::new(
            ApprovalWorkflowStep::new(transport, Arc::new(host.clone())).with_settings(settings),
        );
        let mut router = ActionRouter::new();
        step.register(&mut router);

        let (tx, events) = mpsc::channel(buffer.max(1));
        let runtime = Self {
            host,
            step,
            router: Arc::new(router),
            events,
            tasks: JoinSet::new(),
        };
        (runtime, HostHandle { tx })
    }

    /// Process events until every handle is dropped, then wait for in-flight
    /// clicks to finish.
    pub async fn run(mut self) {
        info!(
            actions = ?self.router.action_ids(),
            "host runtime started"
        );
        while let Some(event) = self.events.recv().await {
            self.handle_event(event).await;
            // Reap finished click tasks so the set stays small.
            while self.tasks.try_join_next().is_some() {}
        }
        while self.tasks.join_next().await.is_some() {}
        info!("host runtime stopped");
    }

    async fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Invoke { inputs, reply } => {
                let result = self.invoke(&inputs).await;
                let _ = reply.send(result);
            },
            HostEvent::Restart {
                execution_id,
                reply,
            } => {
                let result = self.restart(execution_id).await;
                let _ = reply.send(result);
            },
            HostEvent::Action {
                execution_id,
                action_id,
                actor,
                reply,
            } => {
                self.spawn_action(execution_id, action_id, actor, reply)
                    .await;
            },
        }
    }

    async fn invoke(&self, inputs: &Value) -> Result<ExecutionId, RuntimeError> {
        let execution = self.host.begin_execution(inputs).await?;
        let invocation = Invocation::new(execution.id, execution.inputs);
        self.start(&invocation).await?;
        Ok(invocation.execution_id)
    }

    async fn restart(&self, execution_id: ExecutionId) -> Result<MessageId, RuntimeError> {
        let execution = self
            .host
            .get(&execution_id)
            .await
            .ok_or(HostError::UnknownExecution(execution_id))?;
        if !execution.is_pending() {
            return Err(HostError::AlreadyFinished {
                execution_id,
                status: execution.status,
            }
            .into());
        }
        self.start(&Invocation::new(execution_id, execution.inputs))
            .await
    }

    async fn start(&self, invocation: &Invocation) -> Result<MessageId, RuntimeError> {
        let execution_id = invocation.execution_id;
        match self.step.start(invocation).await {
            Ok(outcome) => {
                debug!(%execution_id, completed = outcome.completed, "step started");
                self.host
                    .record_message(&execution_id, outcome.message_id.clone())
                    .await?;
                Ok(outcome.message_id)
            },
            Err(source) => {
                self.host
                    .record_step_error(&execution_id, source.to_string())
                    .await?;
                Err(RuntimeError::Step {
                    execution_id,
                    source,
                })
            },
        }
    }

    async fn spawn_action(
        &mut self,
        execution_id: ExecutionId,
        action_id: String,
        actor: UserId,
        reply: Option<oneshot::Sender<Result<ApprovalDecision, RuntimeError>>>,
    ) {
        let Some(execution) = self.host.get(&execution_id).await else {
            warn!(%execution_id, %action_id, "click for unknown execution");
            if let Some(reply) = reply {
                let _ = reply.send(Err(HostError::UnknownExecution(execution_id).into()));
            }
            return;
        };
        if execution.is_pending() && execution.message_id.is_none() {
            warn!(%execution_id, %action_id, "click before approval message was posted");
            if let Some(reply) = reply {
                let _ = reply.send(Err(HostError::NotAwaitingDecision(execution_id).into()));
            }
            return;
        }

        let event = ActionEvent {
            execution_id,
            action_id,
            actor,
            inputs: execution.inputs,
        };
        let router = Arc::clone(&self.router);
        let host = self.host.clone();
        self.tasks.spawn(async move {
            let result = router.dispatch(event).await.map_err(RuntimeError::from);
            if let Err(e) = &result {
                warn!(%execution_id, error = %e, "action handling failed");
                if let Some(step_error) = e.step_error() {
                    let _ = host.record_step_error(&execution_id, step_error.to_string()).await;
                }
            }
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
        });
    }
}

impl std::fmt::Debug for HostRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRuntime")
            .field("host", &self.host)
            .field("step", &self.step)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countersign_core::{ExecutionStatus, StepError, TransportError};
    use countersign_test::{MockTransport, expense_inputs, reviewer};
    use std::time::Duration;

    fn spawn_runtime(transport: &MockTransport, delay: Duration) -> (InMemoryHost, HostHandle) {
        let host = InMemoryHost::new();
        let (runtime, handle) = HostRuntime::new(
            host.clone(),
            Arc::new(transport.clone()),
            StepSettings::default().with_settling_delay(delay),
            DEFAULT_EVENT_BUFFER,
        );
        tokio::spawn(runtime.run());
        (host, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_then_click() {
        let transport = MockTransport::new();
        let (host, handle) = spawn_runtime(&transport, Duration::from_secs(5));

        let execution_id = handle.invoke(expense_inputs()).await.unwrap();
        let execution = host.get(&execution_id).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Pending);
        assert_eq!(execution.message_id, Some(MessageId::new("msg-0")));

        let decision = handle
            .click(execution_id, "approve_request", reviewer())
            .await
            .unwrap();
        assert!(decision.approved);
        assert_eq!(decision.reviewer, UserId::new("U1"));

        let execution = host.get(&execution_id).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert_eq!(execution.outputs, Some(decision));
    }

    #[tokio::test]
    async fn test_invoke_rejects_invalid_inputs() {
        let (host, handle) = spawn_runtime(&MockTransport::new(), Duration::ZERO);
        let err = handle
            .invoke(serde_json::json!({"requester_id": "U1"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Host(HostError::InvalidInputs { .. })
        ));
        assert!(host.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_leaves_pending_and_restart_recovers() {
        let transport =
            MockTransport::new().with_failure(TransportError::Unavailable("timeout".to_string()));
        let (host, handle) = spawn_runtime(&transport, Duration::ZERO);

        let err = handle.invoke(expense_inputs()).await.unwrap_err();
        let RuntimeError::Step {
            execution_id,
            source,
        } = err
        else {
            panic!("expected step error");
        };
        assert!(matches!(source, StepError::Delivery(_)));

        let execution = host.get(&execution_id).await.unwrap();
        assert!(execution.is_pending());
        assert!(execution.outputs.is_none());
        assert!(execution.message_id.is_none());
        assert!(execution.last_step_error.unwrap().contains("timeout"));

        let err = handle
            .click(execution_id, "approve_request", reviewer())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Host(HostError::NotAwaitingDecision(id)) if id == execution_id
        ));

        let message_id = handle.restart(execution_id).await.unwrap();
        let execution = host.get(&execution_id).await.unwrap();
        assert_eq!(execution.message_id, Some(message_id));
        assert!(execution.last_step_error.is_none());

        let decision = handle
            .click(execution_id, "approve_request", reviewer())
            .await
            .unwrap();
        assert!(decision.approved);
    }

    #[tokio::test]
    async fn test_restart_finished_execution() {
        let (_host, handle) = spawn_runtime(&MockTransport::new(), Duration::ZERO);
        let execution_id = handle.invoke(expense_inputs()).await.unwrap();
        handle
            .click(execution_id, "deny_request", reviewer())
            .await
            .unwrap();

        let err = handle.restart(execution_id).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Host(HostError::AlreadyFinished { .. })
        ));
    }

    #[tokio::test]
    async fn test_click_unknown_execution() {
        let (_host, handle) = spawn_runtime(&MockTransport::new(), Duration::ZERO);
        let err = handle
            .click(ExecutionId::new(), "approve_request", reviewer())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Host(HostError::UnknownExecution(_))
        ));
    }

    #[tokio::test]
    async fn test_click_unknown_action() {
        let (host, handle) = spawn_runtime(&MockTransport::new(), Duration::ZERO);
        let execution_id = handle.invoke(expense_inputs()).await.unwrap();
        let err = handle
            .click(execution_id, "escalate_request", reviewer())
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Dispatch(_)));
        assert!(host.get(&execution_id).await.unwrap().is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settling_does_not_block_queue() {
        let transport = MockTransport::new();
        let (host, handle) = spawn_runtime(&transport, Duration::from_secs(5));

        let first = handle.invoke(expense_inputs()).await.unwrap();
        handle
            .click_detached(first, "approve_request", reviewer())
            .await
            .unwrap();

        // The queue keeps serving while the first click settles.
        let second = handle.invoke(expense_inputs()).await.unwrap();
        assert!(host.get(&first).await.unwrap().is_pending());
        assert_eq!(transport.post_count(), 2);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(
            host.get(&first).await.unwrap().status,
            ExecutionStatus::Completed
        );
        assert!(host.get(&second).await.unwrap().is_pending());
    }

    #[tokio::test]
    async fn test_handle_fails_after_shutdown() {
        let host = InMemoryHost::new();
        let (runtime, handle) = HostRuntime::new(
            host,
            Arc::new(MockTransport::new()),
            StepSettings::default(),
            0,
        );
        drop(runtime);
        let err = handle.invoke(expense_inputs()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Host(HostError::Shutdown)));
    }
}
