//! Cross-Tab Reconciler.
//!
//! Decides, for every incoming signal, whether it is this tab's own write
//! echoing back, a genuine remote change to merge, or a stale/duplicate
//! signal to discard. Accepted signals are applied through the Live State
//! Store, whose `state:*` events then reach the panel and other listeners.
//!
//! All decision methods take an explicit `now_ms` so the clock stays
//! injectable; the `*_now` wrappers read the system clock.

use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::managers::state_store::{StateEvent, StateStore};
use crate::services::message_contract::{MessageContract, MessageContractTrait};
use crate::timing::{
    MESSAGE_DEDUP_WINDOW_MS, OUT_OF_ORDER_TOLERANCE_MS, STORAGE_DEDUP_WINDOW_MS,
};
use crate::types::envelope::PersistedStateEnvelope;
use crate::types::message::{Message, MessageType};
use crate::types::quick_tab::QuickTabPatch;

/// Outcome of a reconciliation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDisposition {
    /// Genuine remote change, merged into the store.
    Applied,
    /// This tab's own write echoing back; discarded.
    SelfEcho,
    /// Same-type repeat inside the message dedup window; discarded.
    Duplicate,
    /// Older than the ordering tolerance allows; discarded.
    Stale,
    /// Failed message validation; discarded at the boundary.
    Invalid,
}

/// Trait defining the reconciler interface.
pub trait ReconcilerTrait {
    fn note_own_write(&mut self, save_id: &str, now_ms: i64);
    fn handle_storage_change(
        &mut self,
        store: &StateStore,
        envelope: &PersistedStateEnvelope,
        now_ms: i64,
    ) -> SignalDisposition;
    fn handle_broadcast(
        &mut self,
        store: &StateStore,
        message: &Message,
        now_ms: i64,
    ) -> SignalDisposition;
}

/// Reconciler state: the ledger of locally generated save ids, per-type
/// message timestamps, and the newest applied signal timestamp.
pub struct Reconciler {
    own_save_ids: VecDeque<(String, i64)>,
    recent_messages: HashMap<MessageType, i64>,
    last_applied_at: Option<i64>,
    contract: MessageContract,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            own_save_ids: VecDeque::new(),
            recent_messages: HashMap::new(),
            last_applied_at: None,
            contract: MessageContract::new(),
        }
    }

    pub fn last_applied_at(&self) -> Option<i64> {
        self.last_applied_at
    }

    fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    /// Drops ledger entries older than the dedup window.
    fn prune_ledger(&mut self, now_ms: i64) {
        while let Some((_, recorded_at)) = self.own_save_ids.front() {
            if now_ms - recorded_at > STORAGE_DEDUP_WINDOW_MS {
                self.own_save_ids.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_own_recent_write(&mut self, save_id: &str, now_ms: i64) -> bool {
        self.prune_ledger(now_ms);
        self.own_save_ids.iter().any(|(id, _)| id == save_id)
    }

    /// A signal is stale when its timestamp is further behind the newest
    /// applied signal than the ordering tolerance allows.
    fn is_stale(&self, timestamp: i64) -> bool {
        match self.last_applied_at {
            Some(last) => timestamp < last - OUT_OF_ORDER_TOLERANCE_MS,
            None => false,
        }
    }

    /// Never moves the horizon backwards when accepting an older-but-
    /// tolerated signal.
    fn mark_applied(&mut self, timestamp: i64) {
        self.last_applied_at = Some(match self.last_applied_at {
            Some(last) => last.max(timestamp),
            None => timestamp,
        });
    }

    /// Applies an accepted broadcast message through store mutations.
    fn apply_message(store: &StateStore, message: &Message) {
        match message.message_type {
            MessageType::Created => {
                if let Some(record) = message.record.clone() {
                    if let Some(event) = store.merge_record(record) {
                        store.emit(&event);
                    }
                }
            }
            MessageType::Closed => {
                if let Some(id) = message.quick_tab_id.as_deref() {
                    if store.merge_remove(id) {
                        store.emit(&StateEvent::Deleted {
                            id: id.to_string(),
                        });
                    }
                }
            }
            MessageType::Minimized | MessageType::Restored => {
                let minimized = message.message_type == MessageType::Minimized;
                Self::apply_patch(
                    store,
                    message,
                    QuickTabPatch {
                        minimized: Some(minimized),
                        ..QuickTabPatch::default()
                    },
                );
            }
            MessageType::Navigated => {
                Self::apply_patch(
                    store,
                    message,
                    QuickTabPatch {
                        url: message.url.clone(),
                        title: message.title.clone(),
                        ..QuickTabPatch::default()
                    },
                );
            }
            MessageType::PositionChanged => {
                Self::apply_patch(
                    store,
                    message,
                    QuickTabPatch {
                        position: message.position,
                        ..QuickTabPatch::default()
                    },
                );
            }
            MessageType::SizeChanged => {
                Self::apply_patch(
                    store,
                    message,
                    QuickTabPatch {
                        size: message.size,
                        ..QuickTabPatch::default()
                    },
                );
            }
            MessageType::CloseAll => {
                store.merge_clear();
                store.emit(&StateEvent::Cleared);
            }
            MessageType::CloseMinimized => {
                for id in Self::minimized_ids(store) {
                    if store.merge_remove(&id) {
                        store.emit(&StateEvent::Deleted { id });
                    }
                }
            }
            // Background request/response; nothing to merge.
            MessageType::FocusOriginTab => {}
        }
    }

    fn apply_patch(store: &StateStore, message: &Message, patch: QuickTabPatch) {
        if let Some(id) = message.quick_tab_id.as_deref() {
            if let Some(record) = store.merge_patch(id, &patch) {
                store.emit(&StateEvent::Updated { record });
            }
        }
    }

    fn minimized_ids(store: &StateStore) -> Vec<String> {
        store
            .get_all()
            .into_iter()
            .filter(|r| r.visibility.minimized)
            .map(|r| r.id)
            .collect()
    }

    /// System-clock convenience over `handle_storage_change`.
    pub fn handle_storage_change_now(
        &mut self,
        store: &StateStore,
        envelope: &PersistedStateEnvelope,
    ) -> SignalDisposition {
        self.handle_storage_change(store, envelope, Self::now_ms())
    }

    /// System-clock convenience over `handle_broadcast`.
    pub fn handle_broadcast_now(
        &mut self,
        store: &StateStore,
        message: &Message,
    ) -> SignalDisposition {
        self.handle_broadcast(store, message, Self::now_ms())
    }

    /// System-clock convenience over `note_own_write`.
    pub fn note_own_write_now(&mut self, save_id: &str) {
        self.note_own_write(save_id, Self::now_ms());
    }
}

impl ReconcilerTrait for Reconciler {
    /// Records a locally generated `saveId` so its storage-change echo can
    /// be recognized and discarded.
    fn note_own_write(&mut self, save_id: &str, now_ms: i64) {
        self.prune_ledger(now_ms);
        self.own_save_ids.push_back((save_id.to_string(), now_ms));
    }

    /// Reconciles a storage-change notification carrying a full envelope.
    fn handle_storage_change(
        &mut self,
        store: &StateStore,
        envelope: &PersistedStateEnvelope,
        now_ms: i64,
    ) -> SignalDisposition {
        if self.is_own_recent_write(&envelope.save_id, now_ms) {
            debug!(save_id = %envelope.save_id, "discarding self-echo");
            return SignalDisposition::SelfEcho;
        }
        if self.is_stale(envelope.timestamp) {
            warn!(
                timestamp = envelope.timestamp,
                last_applied = ?self.last_applied_at,
                "discarding out-of-order storage change"
            );
            return SignalDisposition::Stale;
        }

        store.apply_snapshot(&envelope.tabs);
        self.mark_applied(envelope.timestamp);
        SignalDisposition::Applied
    }

    /// Reconciles a broadcast-channel message from another tab.
    fn handle_broadcast(
        &mut self,
        store: &StateStore,
        message: &Message,
        now_ms: i64,
    ) -> SignalDisposition {
        self.prune_ledger(now_ms);

        let report = self.contract.validate(message);
        if !report.valid {
            warn!(errors = ?report.errors, "discarding invalid broadcast message");
            return SignalDisposition::Invalid;
        }

        // Rapid-fire duplicates from sender races, keyed per type. This
        // supplements correlation-id tracing, it does not replace it.
        if let Some(&previous) = self.recent_messages.get(&message.message_type) {
            if (message.timestamp - previous).abs() < MESSAGE_DEDUP_WINDOW_MS {
                debug!(message_type = ?message.message_type, "discarding duplicate broadcast");
                return SignalDisposition::Duplicate;
            }
        }
        self.recent_messages
            .insert(message.message_type, message.timestamp);

        if self.is_stale(message.timestamp) {
            warn!(
                timestamp = message.timestamp,
                last_applied = ?self.last_applied_at,
                "discarding out-of-order broadcast"
            );
            return SignalDisposition::Stale;
        }

        Self::apply_message(store, message);
        self.mark_applied(message.timestamp);
        SignalDisposition::Applied
    }
}
