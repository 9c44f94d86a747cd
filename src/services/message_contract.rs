//! Message Contract for Quick Tabs inter-context messaging.
//!
//! Validates the fixed message vocabulary and classifies each type by its
//! broadcast pattern so callers know whether a remote notification is
//! required. Validation always returns a structured report and never
//! panics; malformed messages are discarded at the boundary by the caller.

use serde_json::Value;

use crate::types::message::{BroadcastPattern, Message, MessageType, ValidationReport};

/// Trait defining the message contract interface.
pub trait MessageContractTrait {
    fn validate(&self, message: &Message) -> ValidationReport;
    fn validate_value(&self, raw: &Value) -> ValidationReport;
    fn is_local_update(&self, message: &Message) -> bool;
    fn requires_broadcast(&self, message: &Message) -> bool;
}

/// Stateless validator/classifier over the message taxonomy.
#[derive(Debug, Default)]
pub struct MessageContract;

impl MessageContract {
    pub fn new() -> Self {
        Self
    }

    /// Checks the universal fields every message must carry.
    fn check_universal(message: &Message, errors: &mut Vec<String>) {
        if message.correlation_id.is_empty() {
            errors.push("missing correlationId".to_string());
        }
        if message.timestamp <= 0 {
            errors.push("missing or invalid timestamp".to_string());
        }
    }

    /// Dispatches to the per-type required-field checks.
    fn check_type_fields(message: &Message, errors: &mut Vec<String>) {
        let needs_id = |errors: &mut Vec<String>| {
            if message.quick_tab_id.is_none() {
                errors.push("missing quickTabId".to_string());
            }
        };
        match message.message_type {
            MessageType::Created => {
                if message.record.is_none() {
                    errors.push("missing record".to_string());
                }
            }
            MessageType::Closed
            | MessageType::Minimized
            | MessageType::Restored
            | MessageType::FocusOriginTab => needs_id(errors),
            MessageType::Navigated => {
                needs_id(errors);
                if message.url.is_none() {
                    errors.push("missing url".to_string());
                }
            }
            MessageType::PositionChanged => {
                needs_id(errors);
                if message.position.is_none() {
                    errors.push("missing newPosition".to_string());
                }
            }
            MessageType::SizeChanged => {
                needs_id(errors);
                if message.size.is_none() {
                    errors.push("missing newSize".to_string());
                }
            }
            MessageType::CloseAll | MessageType::CloseMinimized => {}
        }
    }
}

impl MessageContractTrait for MessageContract {
    /// Validates a typed message: universal fields first, then the
    /// per-type required fields.
    fn validate(&self, message: &Message) -> ValidationReport {
        let mut errors = Vec::new();
        Self::check_universal(message, &mut errors);
        Self::check_type_fields(message, &mut errors);
        if errors.is_empty() {
            ValidationReport::ok()
        } else {
            ValidationReport::failed(errors)
        }
    }

    /// Validates a raw wire payload before it is trusted as a `Message`.
    ///
    /// An unknown `type` string fails membership in the known set; missing
    /// universal fields are reported individually.
    fn validate_value(&self, raw: &Value) -> ValidationReport {
        let mut errors = Vec::new();
        let Some(obj) = raw.as_object() else {
            return ValidationReport::failed(vec!["message is not an object".to_string()]);
        };

        match obj.get("type") {
            Some(Value::String(t)) => {
                if serde_json::from_value::<MessageType>(Value::String(t.clone())).is_err() {
                    errors.push(format!("unknown message type: {}", t));
                }
            }
            Some(_) => errors.push("type must be a string".to_string()),
            None => errors.push("missing type".to_string()),
        }
        if !matches!(obj.get("correlationId"), Some(Value::String(s)) if !s.is_empty()) {
            errors.push("missing correlationId".to_string());
        }
        if obj.get("timestamp").and_then(Value::as_i64).unwrap_or(0) <= 0 {
            errors.push("missing or invalid timestamp".to_string());
        }

        if !errors.is_empty() {
            return ValidationReport::failed(errors);
        }

        // Shape is plausible; run the full typed validation.
        match serde_json::from_value::<Message>(raw.clone()) {
            Ok(message) => self.validate(&message),
            Err(e) => ValidationReport::failed(vec![format!("malformed message: {}", e)]),
        }
    }

    /// True for purely intra-tab updates that need no remote notification.
    fn is_local_update(&self, message: &Message) -> bool {
        message.message_type.pattern() == BroadcastPattern::Local
    }

    /// True for messages that must reach other browser tabs, whether
    /// initiated by a content script (Global) or the panel (Manager).
    fn requires_broadcast(&self, message: &Message) -> bool {
        matches!(
            message.message_type.pattern(),
            BroadcastPattern::Global | BroadcastPattern::Manager
        )
    }
}
