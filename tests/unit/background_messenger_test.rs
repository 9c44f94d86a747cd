use std::sync::{Arc, Mutex};

use quicktabs::services::background::{BackgroundMessenger, BackgroundTransport};
use quicktabs::types::errors::MessageError;
use quicktabs::types::message::Message;
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Transport that responds immediately with a canned value and records what
/// it was asked to send.
struct EchoTransport {
    sent: Mutex<Vec<Message>>,
    response: Value,
}

impl EchoTransport {
    fn new(response: Value) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            response,
        }
    }
}

impl BackgroundTransport for EchoTransport {
    fn send(&self, message: &Message) -> oneshot::Receiver<Result<Value, MessageError>> {
        self.sent.lock().unwrap().push(message.clone());
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(self.response.clone()));
        rx
    }
}

/// Transport that drops the response channel without answering.
struct DeadTransport;

impl BackgroundTransport for DeadTransport {
    fn send(&self, _message: &Message) -> oneshot::Receiver<Result<Value, MessageError>> {
        let (tx, rx) = oneshot::channel();
        drop(tx);
        rx
    }
}

/// Transport that never answers and never drops the sender.
struct SilentTransport {
    keep_alive: Mutex<Vec<oneshot::Sender<Result<Value, MessageError>>>>,
}

impl BackgroundTransport for SilentTransport {
    fn send(&self, _message: &Message) -> oneshot::Receiver<Result<Value, MessageError>> {
        let (tx, rx) = oneshot::channel();
        self.keep_alive.lock().unwrap().push(tx);
        rx
    }
}

#[tokio::test]
async fn test_send_returns_response() {
    let transport = Arc::new(EchoTransport::new(json!({"ok": true})));
    let messenger = BackgroundMessenger::new(Arc::clone(&transport) as Arc<dyn BackgroundTransport>);

    let response = messenger.send(&Message::focus_origin_tab("qt-1")).await.unwrap();
    assert_eq!(response, json!({"ok": true}));
    assert_eq!(transport.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_send_rejects_invalid_message_before_transport() {
    let transport = Arc::new(EchoTransport::new(json!({"ok": true})));
    let messenger = BackgroundMessenger::new(Arc::clone(&transport) as Arc<dyn BackgroundTransport>);

    let mut message = Message::focus_origin_tab("qt-1");
    message.quick_tab_id = None;
    let err = messenger.send(&message).await.unwrap_err();

    assert!(matches!(err, MessageError::ValidationFailed(_)));
    // The transport never saw the message.
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_closed_channel_is_transport_error() {
    let messenger = BackgroundMessenger::new(Arc::new(DeadTransport));
    let err = messenger.send(&Message::close_all()).await.unwrap_err();
    assert!(matches!(err, MessageError::Transport(_)));
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_send_times_out() {
    let transport = Arc::new(SilentTransport {
        keep_alive: Mutex::new(Vec::new()),
    });
    let messenger = BackgroundMessenger::with_timeout(transport, 100);

    let err = messenger.send(&Message::close_all()).await.unwrap_err();
    assert!(matches!(err, MessageError::Timeout(100)));
}

#[test]
fn test_default_timeout_is_five_seconds() {
    let messenger = BackgroundMessenger::new(Arc::new(DeadTransport));
    assert_eq!(messenger.timeout_ms(), 5000);
}
