//! Origin-Tab Filter.
//!
//! Storage is shared across all browser tabs, so the global record set
//! spans every origin. A Quick Tab overlay is only ever rendered inside
//! the browser tab that created it; the management panel's counts, by
//! contrast, deliberately aggregate across all origins. These are two
//! distinct views over the same store and must not be conflated.

use serde::{Deserialize, Serialize};

use crate::types::quick_tab::QuickTabRecord;

/// Records relevant for DOM materialization in the given browser tab, in
/// original relative order.
pub fn filter_for_tab(records: &[QuickTabRecord], tab_id: i64) -> Vec<QuickTabRecord> {
    records
        .iter()
        .filter(|r| r.origin_tab_id == tab_id)
        .cloned()
        .collect()
}

/// True if the record belongs to the given browser tab.
pub fn is_own_record(record: &QuickTabRecord, tab_id: i64) -> bool {
    record.origin_tab_id == tab_id
}

/// Global aggregates for the management panel; intentionally unfiltered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PanelCounts {
    pub total: usize,
    pub minimized: usize,
}

pub fn panel_counts(records: &[QuickTabRecord]) -> PanelCounts {
    PanelCounts {
        total: records.len(),
        minimized: records.iter().filter(|r| r.visibility.minimized).count(),
    }
}
