//! Action routing: the handler map clicks are dispatched through.
//!
//! The router is built once at startup and owned by whoever receives events
//! from the platform. A handler can serve several action ids; the approval
//! step registers itself for both of its buttons.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use countersign_core::{ApprovalDecision, StepError, StepResult};

use crate::event::ActionEvent;

/// Something that can act on a button click.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Handle one click and return the decision it produced.
    async fn handle(&self, event: ActionEvent) -> StepResult<ApprovalDecision>;
}

/// Errors from [`ActionRouter::dispatch`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    /// No handler is registered for the action id.
    #[error("no handler registered for action '{0}'")]
    NoHandler(String),

    /// The handler ran and failed.
    #[error(transparent)]
    Step(#[from] StepError),
}

/// Map from action id to handler.
#[derive(Default)]
pub struct ActionRouter {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRouter {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one handler for a set of action ids.
    ///
    /// An id that already has a handler is rebound to the new one.
    pub fn register_handler(&mut self, action_ids: &[&str], handler: Arc<dyn ActionHandler>) {
        for action_id in action_ids {
            if self
                .handlers
                .insert((*action_id).to_string(), Arc::clone(&handler))
                .is_some()
            {
                warn!(action_id = *action_id, "replacing existing action handler");
            }
        }
    }

    /// Route a click to its handler.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NoHandler`] for an unregistered id, otherwise whatever
    /// the handler returned.
    pub async fn dispatch(&self, event: ActionEvent) -> Result<ApprovalDecision, DispatchError> {
        let Some(handler) = self.handlers.get(&event.action_id).map(Arc::clone) else {
            return Err(DispatchError::NoHandler(event.action_id));
        };
        debug!(
            execution_id = %event.execution_id,
            action_id = %event.action_id,
            "dispatching action"
        );
        Ok(handler.handle(event).await?)
    }

    /// Whether an action id has a handler.
    #[must_use]
    pub fn handles(&self, action_id: &str) -> bool {
        self.handlers.contains_key(action_id)
    }

    /// Registered action ids, sorted.
    #[must_use]
    pub fn action_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for ActionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRouter")
            .field("action_ids", &self.action_ids())
            .finish()
    }
}
