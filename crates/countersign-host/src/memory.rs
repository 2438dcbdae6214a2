//! In-memory execution store.
//!
//! All status transitions happen under the store's write lock, which makes
//! [`WorkflowHost::complete_success`] the single serialization point for
//! racing decisions on one execution.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use countersign_core::{
    ApprovalDecision, ApprovalRequest, ExecutionId, FunctionDefinition, HostError, HostResult,
    MessageId, WorkflowExecution, WorkflowHost,
};

/// Workflow host that keeps executions in memory.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct InMemoryHost {
    definition: Arc<FunctionDefinition>,
    executions: Arc<RwLock<HashMap<ExecutionId, WorkflowExecution>>>,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryHost {
    /// Create a host for the approval function.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definition: Arc::new(FunctionDefinition::approval()),
            executions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validate raw inputs and create a pending execution.
    ///
    /// # Errors
    ///
    /// [`HostError::InvalidInputs`] if the inputs violate the input schema.
    pub async fn begin_execution(&self, inputs: &Value) -> HostResult<WorkflowExecution> {
        self.definition
            .input_parameters
            .validate(inputs)
            .map_err(|v| HostError::InvalidInputs {
                field: v.field,
                message: v.message,
            })?;
        let request: ApprovalRequest =
            serde_json::from_value(inputs.clone()).map_err(|e| HostError::InvalidInputs {
                field: "$".to_string(),
                message: e.to_string(),
            })?;

        let execution = WorkflowExecution::new(&self.definition.callback_id, request);
        info!(
            execution_id = %execution.id,
            callback_id = %execution.callback_id,
            "execution created"
        );
        self.executions
            .write()
            .await
            .insert(execution.id, execution.clone());
        Ok(execution)
    }

    /// Remember the message posted for an execution.
    ///
    /// # Errors
    ///
    /// [`HostError::UnknownExecution`] for an unknown id.
    pub async fn record_message(
        &self,
        execution_id: &ExecutionId,
        message_id: MessageId,
    ) -> HostResult<()> {
        self.update(execution_id, |execution| {
            execution.message_id = Some(message_id);
            execution.last_step_error = None;
            Ok(())
        })
        .await
    }

    /// Remember an error the step reported. The status does not change, and
    /// finished executions keep their record untouched.
    ///
    /// # Errors
    ///
    /// [`HostError::UnknownExecution`] for an unknown id.
    pub async fn record_step_error(
        &self,
        execution_id: &ExecutionId,
        error: impl Into<String>,
    ) -> HostResult<()> {
        let error = error.into();
        self.update(execution_id, |execution| {
            if execution.is_pending() {
                execution.last_step_error = Some(error);
            }
            Ok(())
        })
        .await
    }

    /// Fail a pending execution.
    ///
    /// # Errors
    ///
    /// [`HostError::UnknownExecution`] for an unknown id,
    /// [`HostError::AlreadyFinished`] if it is no longer pending.
    pub async fn fail(&self, execution_id: &ExecutionId, reason: impl Into<String>) -> HostResult<()> {
        let reason = reason.into();
        self.update(execution_id, |execution| execution.fail(reason))
            .await?;
        warn!(%execution_id, "execution failed");
        Ok(())
    }

    /// Snapshot of one execution.
    pub async fn get(&self, execution_id: &ExecutionId) -> Option<WorkflowExecution> {
        self.executions.read().await.get(execution_id).cloned()
    }

    /// Snapshot of all executions, oldest first.
    pub async fn list(&self) -> Vec<WorkflowExecution> {
        let mut all: Vec<WorkflowExecution> =
            self.executions.read().await.values().cloned().collect();
        all.sort_by_key(|e| e.created_at);
        all
    }

    /// Number of executions still awaiting a decision.
    pub async fn pending_count(&self) -> usize {
        self.executions
            .read()
            .await
            .values()
            .filter(|e| e.is_pending())
            .count()
    }

    async fn update<F>(&self, execution_id: &ExecutionId, f: F) -> HostResult<()>
    where
        F: FnOnce(&mut WorkflowExecution) -> HostResult<()>,
    {
        let mut guard = self.executions.write().await;
        let execution = guard
            .get_mut(execution_id)
            .ok_or(HostError::UnknownExecution(*execution_id))?;
        f(execution)
    }
}

#[async_trait]
impl WorkflowHost for InMemoryHost {
    async fn complete_success(
        &self,
        execution_id: &ExecutionId,
        outputs: &ApprovalDecision,
    ) -> HostResult<()> {
        let value = serde_json::to_value(outputs).map_err(|e| HostError::InvalidOutputs {
            field: "$".to_string(),
            message: e.to_string(),
        })?;
        self.definition
            .output_parameters
            .validate(&value)
            .map_err(|v| HostError::InvalidOutputs {
                field: v.field,
                message: v.message,
            })?;

        let outputs = outputs.clone();
        self.update(execution_id, |execution| execution.complete(outputs))
            .await
    }
}

impl std::fmt::Debug for InMemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHost")
            .field("callback_id", &self.definition.callback_id)
            .finish_non_exhaustive()
    }
}
