//! App Core for Quick Tabs.
//!
//! `QuickTabsApp` wires the store, reconciler, panel controller, codec, and
//! storage area together for one browser tab context. All formerly ambient
//! globals live in the explicit `RuntimeContext` handed in at construction.
//!
//! User actions return the outbound `Message`; the embedding layer checks
//! `requires_broadcast` and puts it on the wire. Inbound signals enter
//! through `handle_storage_change` and `handle_broadcast`.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::{error, warn};
use uuid::Uuid;

use crate::managers::origin_filter::{self, PanelCounts};
use crate::managers::panel_controller::{PanelController, PanelRenderer};
use crate::managers::reconciler::{Reconciler, SignalDisposition};
use crate::managers::state_store::{StatePersister, StateStore};
use crate::services::background::{BackgroundMessenger, BackgroundTransport};
use crate::services::event_bus::SubscriptionSet;
use crate::services::storage_area::StorageArea;
use crate::services::storage_codec::{StorageCodec, StorageCodecTrait};
use crate::types::envelope::{PersistedStateEnvelope, QUICK_TABS_STORAGE_KEY};
use crate::types::errors::MessageError;
use crate::types::message::Message;
use crate::types::quick_tab::{Position, QuickTabPatch, QuickTabRecord, Size};

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Explicit per-context state that would otherwise be module-level globals.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// Identifier of the browser tab this stack instance runs in.
    pub tab_id: i64,
    pub debug: bool,
}

impl RuntimeContext {
    pub fn new(tab_id: i64) -> Self {
        Self {
            tab_id,
            debug: false,
        }
    }
}

/// Persists store snapshots to the storage area, recording each write's
/// `saveId` so the reconciler can recognize the echo.
struct EnvelopePersister {
    codec: StorageCodec,
    storage: Arc<dyn StorageArea>,
    reconciler: Arc<Mutex<Reconciler>>,
}

impl StatePersister for EnvelopePersister {
    fn persist(&self, records: &[QuickTabRecord]) {
        let envelope = self.codec.encode(records);
        if let Ok(mut reconciler) = self.reconciler.lock() {
            reconciler.note_own_write_now(&envelope.save_id);
        }
        let value = match serde_json::to_value(&envelope) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "failed to serialize envelope; state not persisted");
                return;
            }
        };
        // A failed write is logged, never thrown: in-memory state stays
        // authoritative for this session and the user's action proceeds.
        if let Err(e) = self.storage.set(QUICK_TABS_STORAGE_KEY, value) {
            error!(error = %e, "storage write failed; state not persisted");
        }
    }
}

/// Central wiring for one browser tab's Quick Tabs stack.
pub struct QuickTabsApp {
    pub context: RuntimeContext,
    pub store: StateStore,
    pub panel: PanelController,
    reconciler: Arc<Mutex<Reconciler>>,
    storage: Arc<dyn StorageArea>,
    codec: StorageCodec,
    messenger: Option<BackgroundMessenger>,
    subscriptions: SubscriptionSet,
}

impl QuickTabsApp {
    pub fn new(
        context: RuntimeContext,
        storage: Arc<dyn StorageArea>,
        renderer: Box<dyn PanelRenderer>,
    ) -> Self {
        let store = StateStore::new();
        let reconciler = Arc::new(Mutex::new(Reconciler::new()));
        let panel = PanelController::new(renderer);

        store.set_persister(Arc::new(EnvelopePersister {
            codec: StorageCodec::new(),
            storage: Arc::clone(&storage),
            reconciler: Arc::clone(&reconciler),
        }));

        let mut subscriptions = SubscriptionSet::new();
        subscriptions.push(panel.attach(&store));

        Self {
            context,
            store,
            panel,
            reconciler,
            storage,
            codec: StorageCodec::new(),
            messenger: None,
            subscriptions,
        }
    }

    /// Installs the transport used to reach the background context.
    pub fn set_background_transport(&mut self, transport: Arc<dyn BackgroundTransport>) {
        self.messenger = Some(BackgroundMessenger::new(transport));
    }

    fn lock_reconciler(&self) -> std::sync::MutexGuard<'_, Reconciler> {
        match self.reconciler.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Hydrates the store from persisted storage, filtered to this browser
    /// tab's own records. An unrecognized envelope leaves the store empty
    /// rather than failing startup.
    pub fn startup(&mut self) {
        let records = match self.storage.get(QUICK_TABS_STORAGE_KEY) {
            Ok(Some(raw)) => match self.codec.decode(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "stored state unusable; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "storage read failed; starting empty");
                Vec::new()
            }
        };
        self.store.hydrate(&records, self.context.tab_id);
    }

    /// Releases every event subscription held by this instance.
    pub fn shutdown(&mut self) {
        self.subscriptions.dispose_all();
    }

    // --- user actions; each returns the outbound message ---

    pub fn create_quick_tab(&self, url: &str, title: &str) -> Message {
        let record = QuickTabRecord::new(
            Uuid::new_v4().to_string(),
            url,
            title,
            self.context.tab_id,
        );
        self.store.add(record.clone());
        Message::created(record)
    }

    pub fn close_quick_tab(&self, id: &str) -> Option<Message> {
        if self.store.remove(id) {
            Some(Message::closed(id))
        } else {
            None
        }
    }

    pub fn set_minimized(&self, id: &str, minimized: bool) -> Option<Message> {
        let patch = QuickTabPatch {
            minimized: Some(minimized),
            ..QuickTabPatch::default()
        };
        self.store.update(id, &patch)?;
        Some(if minimized {
            Message::minimized(id)
        } else {
            Message::restored(id)
        })
    }

    pub fn move_quick_tab(&self, id: &str, position: Position) -> Option<Message> {
        let patch = QuickTabPatch {
            position: Some(position),
            ..QuickTabPatch::default()
        };
        self.store.update(id, &patch)?;
        Some(Message::position_changed(id, position))
    }

    pub fn resize_quick_tab(&self, id: &str, size: Size) -> Option<Message> {
        let patch = QuickTabPatch {
            size: Some(size),
            ..QuickTabPatch::default()
        };
        self.store.update(id, &patch)?;
        Some(Message::size_changed(id, size))
    }

    pub fn navigate_quick_tab(&self, id: &str, url: &str, title: &str) -> Option<Message> {
        let patch = QuickTabPatch {
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            ..QuickTabPatch::default()
        };
        self.store.update(id, &patch)?;
        Some(Message::navigated(id, url, title))
    }

    /// Panel bulk action. The refresh bypasses open/closed gating so the
    /// user sees immediate confirmation.
    pub fn close_all(&self) -> Message {
        self.store.clear();
        self.panel.force_refresh(&self.store);
        Message::close_all()
    }

    /// Panel bulk action over minimized records only.
    pub fn close_minimized(&self) -> Message {
        self.store.remove_minimized();
        self.panel.force_refresh(&self.store);
        Message::close_minimized()
    }

    /// Destructive, user-confirmed reset of the persisted envelope.
    /// Interactive confirmation happens in the embedding layer before this
    /// is called.
    pub fn clear_all_storage(&self) {
        self.store.clear();
        if let Err(e) = self.storage.remove(QUICK_TABS_STORAGE_KEY) {
            error!(error = %e, "failed to clear persisted state");
        }
        self.panel.force_refresh(&self.store);
    }

    // --- inbound signals ---

    /// Reconciles a storage-change notification. The raw value may be a
    /// current envelope or any historical format the codec understands.
    pub fn handle_storage_change(&self, raw: &Value) -> SignalDisposition {
        let envelope = match serde_json::from_value::<PersistedStateEnvelope>(raw.clone()) {
            Ok(envelope) => envelope,
            // Legacy or damaged envelope: recover the records and pull the
            // metadata fields out by hand.
            Err(_) => match self.codec.decode(raw) {
                Ok(tabs) => PersistedStateEnvelope {
                    tabs,
                    save_id: raw
                        .get("saveId")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    // A legacy envelope carries no write time; treating it
                    // as current keeps it from being judged stale against
                    // signals already applied this session.
                    timestamp: raw
                        .get("timestamp")
                        .and_then(Value::as_i64)
                        .unwrap_or_else(now_ms),
                },
                Err(e) => {
                    warn!(error = %e, "ignoring unrecognized storage change");
                    return SignalDisposition::Invalid;
                }
            },
        };
        self.lock_reconciler()
            .handle_storage_change_now(&self.store, &envelope)
    }

    /// Reconciles a broadcast-channel message from another tab.
    pub fn handle_broadcast(&self, message: &Message) -> SignalDisposition {
        self.lock_reconciler()
            .handle_broadcast_now(&self.store, message)
    }

    // --- views and background requests ---

    /// Records this browser tab materializes into its DOM.
    pub fn visible_records(&self) -> Vec<QuickTabRecord> {
        origin_filter::filter_for_tab(&self.store.get_all(), self.context.tab_id)
    }

    /// Global aggregates for the management panel.
    pub fn panel_counts(&self) -> PanelCounts {
        origin_filter::panel_counts(&self.store.get_all())
    }

    /// Asks the background context to activate a Quick Tab's origin tab.
    pub async fn focus_origin_tab(&self, quick_tab_id: &str) -> Result<Value, MessageError> {
        let messenger = self.messenger.as_ref().ok_or_else(|| {
            MessageError::Transport("no background transport configured".to_string())
        })?;
        messenger.send(&Message::focus_origin_tab(quick_tab_id)).await
    }
}
