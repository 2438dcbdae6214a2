//! Transport used by `simulate`: writes approval messages to the log.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

use countersign_core::{ApprovalMessage, MessageId, MessageTransport, TransportError};

/// A [`MessageTransport`] that logs each message instead of sending it.
#[derive(Debug, Default)]
pub(crate) struct LogTransport {
    reject: bool,
    sent: AtomicU64,
}

impl LogTransport {
    /// Create a transport that accepts every message.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Create a transport that rejects every message.
    #[must_use]
    pub(crate) fn rejecting() -> Self {
        Self {
            reject: true,
            sent: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl MessageTransport for LogTransport {
    async fn post_message(&self, message: &ApprovalMessage) -> Result<MessageId, TransportError> {
        if self.reject {
            warn!(channel = %message.channel, "simulated delivery failure");
            return Err(TransportError::Unavailable(
                "delivery disabled by --fail-delivery".to_string(),
            ));
        }

        let n = self.sent.fetch_add(1, Ordering::Relaxed);
        let buttons: Vec<&str> = message.actions.iter().map(|a| a.label.as_str()).collect();
        info!(
            channel = %message.channel,
            block_id = %message.block_id,
            ?buttons,
            text = %message.text,
            "approval message posted"
        );
        Ok(MessageId::new(format!("sim-{n}")))
    }
}
