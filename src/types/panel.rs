use serde::{Deserialize, Serialize};

/// Presentation state for the management panel.
///
/// `is_open` lives here and nowhere else; callers that keep a convenience
/// copy must re-query the controller on every read. Only the open flag and
/// geometry are ever persisted; `pending_refresh` is session-local.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PanelViewState {
    pub is_open: bool,
    /// Set when state changed while the panel was closed; acted upon and
    /// cleared on the next open.
    pub pending_refresh: bool,
    /// Diagnostic only.
    pub last_update_timestamp: i64,
}
