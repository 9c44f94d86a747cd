//! Request/response messaging to the privileged background context.
//!
//! Content scripts cannot switch the active browser tab or read container
//! metadata directly; those operations go through a transport to the
//! background script. Every send races against a caller-supplied timeout
//! and settles exactly once: a timeout yields `MessageError::Timeout`,
//! distinct from transport failures so callers can retry the latter but
//! not blindly retry the former.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

use crate::services::message_contract::{MessageContract, MessageContractTrait};
use crate::timing::MESSAGE_SEND_TIMEOUT_MS;
use crate::types::errors::MessageError;
use crate::types::message::Message;

/// Transport seam to the background context. Implementations hand back a
/// one-shot receiver that resolves with the response; dropping the sender
/// signals a transport failure.
pub trait BackgroundTransport: Send + Sync {
    fn send(&self, message: &Message) -> oneshot::Receiver<Result<Value, MessageError>>;
}

/// Messenger wrapping a transport with validation and timeout handling.
pub struct BackgroundMessenger {
    transport: Arc<dyn BackgroundTransport>,
    contract: MessageContract,
    timeout_ms: u64,
}

impl BackgroundMessenger {
    pub fn new(transport: Arc<dyn BackgroundTransport>) -> Self {
        Self::with_timeout(transport, MESSAGE_SEND_TIMEOUT_MS)
    }

    pub fn with_timeout(transport: Arc<dyn BackgroundTransport>, timeout_ms: u64) -> Self {
        Self {
            transport,
            contract: MessageContract::new(),
            timeout_ms,
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Sends a message and awaits the response or the timeout, whichever
    /// settles first.
    pub async fn send(&self, message: &Message) -> Result<Value, MessageError> {
        let report = self.contract.validate(message);
        if !report.valid {
            warn!(errors = ?report.errors, "refusing to send invalid message");
            return Err(MessageError::ValidationFailed(report.errors));
        }

        let receiver = self.transport.send(message);
        match tokio::time::timeout(Duration::from_millis(self.timeout_ms), receiver).await {
            Ok(Ok(response)) => response,
            // Sender dropped without responding: transport-level failure.
            Ok(Err(_)) => Err(MessageError::Transport(
                "background channel closed without a response".to_string(),
            )),
            Err(_) => Err(MessageError::Timeout(self.timeout_ms)),
        }
    }
}
