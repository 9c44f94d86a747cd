use serde::{Deserialize, Serialize};

use super::quick_tab::QuickTabRecord;

/// Storage key holding the persisted envelope.
pub const QUICK_TABS_STORAGE_KEY: &str = "quickTabsState";

/// Top-level persisted object wrapping the tab list plus write metadata.
///
/// Every write replaces the entire envelope; there are no partial writes.
/// `save_id` is unique per write so the writer can recognize its own echo
/// when the storage change notification comes back around.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedStateEnvelope {
    pub tabs: Vec<QuickTabRecord>,
    pub save_id: String,
    /// Write time in Unix milliseconds. Monotonic per writer, not globally
    /// ordered across tabs.
    pub timestamp: i64,
}
