use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::quick_tab::{Position, QuickTabRecord, Size};

/// Fixed vocabulary of inter-tab / inter-script messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    /// A Quick Tab was created (carries the full record).
    Created,
    /// A Quick Tab was explicitly closed.
    Closed,
    Minimized,
    Restored,
    /// The embedded content navigated; url/title changed.
    Navigated,
    /// In-progress drag position update.
    PositionChanged,
    /// In-progress resize update.
    SizeChanged,
    /// Request to the background context to activate the origin browser tab.
    FocusOriginTab,
    /// Management panel bulk action: close every Quick Tab.
    CloseAll,
    /// Management panel bulk action: close minimized Quick Tabs only.
    CloseMinimized,
}

/// How a message propagates between browser tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastPattern {
    /// Purely intra-tab; no remote notification required.
    Local,
    /// Must be broadcast to all other browser tabs.
    Global,
    /// Broadcast initiated by the management panel itself.
    Manager,
}

impl MessageType {
    pub fn pattern(self) -> BroadcastPattern {
        match self {
            MessageType::PositionChanged
            | MessageType::SizeChanged
            | MessageType::FocusOriginTab => BroadcastPattern::Local,
            MessageType::Created
            | MessageType::Closed
            | MessageType::Minimized
            | MessageType::Restored
            | MessageType::Navigated => BroadcastPattern::Global,
            MessageType::CloseAll | MessageType::CloseMinimized => BroadcastPattern::Manager,
        }
    }
}

/// One message on the wire. Type-specific fields are optional and checked
/// by the message contract validator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Unique per message; used for de-duplication and tracing.
    pub correlation_id: String,
    /// Unix milliseconds at send time.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quick_tab_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<QuickTabRecord>,
}

/// Structured validation outcome; validation never throws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

impl Message {
    fn base(message_type: MessageType) -> Self {
        Self {
            message_type,
            correlation_id: Uuid::new_v4().to_string(),
            timestamp: now_ms(),
            quick_tab_id: None,
            position: None,
            size: None,
            url: None,
            title: None,
            record: None,
        }
    }

    pub fn created(record: QuickTabRecord) -> Self {
        let mut msg = Self::base(MessageType::Created);
        msg.quick_tab_id = Some(record.id.clone());
        msg.record = Some(record);
        msg
    }

    pub fn closed(quick_tab_id: &str) -> Self {
        let mut msg = Self::base(MessageType::Closed);
        msg.quick_tab_id = Some(quick_tab_id.to_string());
        msg
    }

    pub fn minimized(quick_tab_id: &str) -> Self {
        let mut msg = Self::base(MessageType::Minimized);
        msg.quick_tab_id = Some(quick_tab_id.to_string());
        msg
    }

    pub fn restored(quick_tab_id: &str) -> Self {
        let mut msg = Self::base(MessageType::Restored);
        msg.quick_tab_id = Some(quick_tab_id.to_string());
        msg
    }

    pub fn navigated(quick_tab_id: &str, url: &str, title: &str) -> Self {
        let mut msg = Self::base(MessageType::Navigated);
        msg.quick_tab_id = Some(quick_tab_id.to_string());
        msg.url = Some(url.to_string());
        msg.title = Some(title.to_string());
        msg
    }

    pub fn position_changed(quick_tab_id: &str, position: Position) -> Self {
        let mut msg = Self::base(MessageType::PositionChanged);
        msg.quick_tab_id = Some(quick_tab_id.to_string());
        msg.position = Some(position);
        msg
    }

    pub fn size_changed(quick_tab_id: &str, size: Size) -> Self {
        let mut msg = Self::base(MessageType::SizeChanged);
        msg.quick_tab_id = Some(quick_tab_id.to_string());
        msg.size = Some(size);
        msg
    }

    pub fn focus_origin_tab(quick_tab_id: &str) -> Self {
        let mut msg = Self::base(MessageType::FocusOriginTab);
        msg.quick_tab_id = Some(quick_tab_id.to_string());
        msg
    }

    pub fn close_all() -> Self {
        Self::base(MessageType::CloseAll)
    }

    pub fn close_minimized() -> Self {
        Self::base(MessageType::CloseMinimized)
    }
}
