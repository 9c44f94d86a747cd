//! Timing Policy for Quick Tabs cross-tab synchronization.
//!
//! Named tolerance windows, no logic. Every component that needs a
//! deduplication or staleness decision pulls its constant from here so the
//! numbers live in exactly one place.

/// How long a locally generated `saveId` is remembered for self-echo
/// detection. The storage API's change notification arrives on other
/// contexts 100-250ms after the write; this window covers that plus jitter.
pub const STORAGE_DEDUP_WINDOW_MS: i64 = 300;

/// A broadcast message of the same type arriving within this window of the
/// previous one is treated as a rapid-fire duplicate and dropped.
pub const MESSAGE_DEDUP_WINDOW_MS: i64 = 50;

/// A remote signal may be up to this much older than the newest applied
/// signal and still be merged; clock and delivery jitter across tabs is
/// expected. Anything older is discarded.
pub const OUT_OF_ORDER_TOLERANCE_MS: i64 = 100;

/// Default timeout for request/response messages to the background context.
pub const MESSAGE_SEND_TIMEOUT_MS: u64 = 5000;
