//! Live State Store for Quick Tabs.
//!
//! The authoritative, queryable collection of Quick Tab records for the
//! current browser tab context. Every other component reads and writes
//! through this store. Each mutation emits its `StateEvent` synchronously
//! once the in-memory change is applied, then hands a snapshot to the
//! persister; persistence is fire-and-forget and never blocks emission.
//!
//! The store is a cheap handle over shared state so event listeners may
//! query it while an emission is in flight.

use std::sync::{Arc, Mutex};

use crate::managers::origin_filter;
use crate::services::event_bus::EventBus;
use crate::types::quick_tab::{QuickTabPatch, QuickTabRecord};

/// Change notification emitted by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    Added { record: QuickTabRecord },
    Updated { record: QuickTabRecord },
    Deleted { id: String },
    Cleared,
    /// Bulk initial load, distinct from incremental `Added` events.
    Hydrated { count: usize },
}

/// Persistence hook invoked after each local mutation with a full snapshot.
pub trait StatePersister: Send + Sync {
    fn persist(&self, records: &[QuickTabRecord]);
}

struct StoreInner {
    records: Vec<QuickTabRecord>,
}

/// Cloneable handle to the per-tab live state.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<Mutex<StoreInner>>,
    events: EventBus<StateEvent>,
    persister: Arc<Mutex<Option<Arc<dyn StatePersister>>>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                records: Vec::new(),
            })),
            events: EventBus::new(),
            persister: Arc::new(Mutex::new(None)),
        }
    }

    pub fn events(&self) -> &EventBus<StateEvent> {
        &self.events
    }

    /// Installs the persistence hook fired after local mutations.
    pub fn set_persister(&self, persister: Arc<dyn StatePersister>) {
        if let Ok(mut slot) = self.persister.lock() {
            *slot = Some(persister);
        }
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist_snapshot(&self) {
        let persister = match self.persister.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        if let Some(persister) = persister {
            let snapshot = self.get_all();
            persister.persist(&snapshot);
        }
    }

    // --- queries ---

    /// Point-in-time snapshot; no live references leak out.
    pub fn get_all(&self) -> Vec<QuickTabRecord> {
        self.lock_inner().records.clone()
    }

    pub fn get_by_id(&self, id: &str) -> Option<QuickTabRecord> {
        self.lock_inner().records.iter().find(|r| r.id == id).cloned()
    }

    pub fn count(&self) -> usize {
        self.lock_inner().records.len()
    }

    // --- local mutations (emit, then persist) ---

    /// Inserts a record. A duplicate id is treated as an update; the store
    /// never holds two records with the same id.
    pub fn add(&self, record: QuickTabRecord) {
        let event = self.merge_record(record);
        if let Some(event) = event {
            self.events.emit(&event);
        }
        self.persist_snapshot();
    }

    /// Applies a partial update. Returns the updated record, or `None` if
    /// the id is unknown or the patch changed nothing.
    pub fn update(&self, id: &str, patch: &QuickTabPatch) -> Option<QuickTabRecord> {
        let updated = self.merge_patch(id, patch);
        if let Some(ref record) = updated {
            self.events.emit(&StateEvent::Updated {
                record: record.clone(),
            });
            self.persist_snapshot();
        }
        updated
    }

    /// Removes a record. Returns false if the id is unknown.
    pub fn remove(&self, id: &str) -> bool {
        if self.merge_remove(id) {
            self.events.emit(&StateEvent::Deleted { id: id.to_string() });
            self.persist_snapshot();
            true
        } else {
            false
        }
    }

    pub fn clear(&self) {
        self.merge_clear();
        self.events.emit(&StateEvent::Cleared);
        self.persist_snapshot();
    }

    /// Removes every minimized record. Returns the removed ids.
    pub fn remove_minimized(&self) -> Vec<String> {
        let removed: Vec<String> = {
            let mut inner = self.lock_inner();
            let ids: Vec<String> = inner
                .records
                .iter()
                .filter(|r| r.visibility.minimized)
                .map(|r| r.id.clone())
                .collect();
            inner.records.retain(|r| !r.visibility.minimized);
            ids
        };
        for id in &removed {
            self.events.emit(&StateEvent::Deleted { id: id.clone() });
        }
        if !removed.is_empty() {
            self.persist_snapshot();
        }
        removed
    }

    /// Bulk initial load from storage, filtered to this browser tab's own
    /// records. Emits a single `Hydrated` event and does not re-persist.
    pub fn hydrate(&self, records: &[QuickTabRecord], tab_id: i64) {
        let own = origin_filter::filter_for_tab(records, tab_id);
        let count = own.len();
        {
            let mut inner = self.lock_inner();
            inner.records = own;
        }
        self.events.emit(&StateEvent::Hydrated { count });
    }

    // --- reconciler-facing merges (emit, no persist) ---
    //
    // Remote changes already live in storage; writing them back would only
    // generate echo traffic for every other tab.

    /// Upserts a record without persisting. Returns the emitted-by-caller
    /// event, `None` if the record was already identical.
    pub fn merge_record(&self, record: QuickTabRecord) -> Option<StateEvent> {
        let mut inner = self.lock_inner();
        match inner.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                if *existing == record {
                    None
                } else {
                    *existing = record.clone();
                    Some(StateEvent::Updated { record })
                }
            }
            None => {
                inner.records.push(record.clone());
                Some(StateEvent::Added { record })
            }
        }
    }

    /// Patches a record without persisting; `None` if unknown or unchanged.
    pub fn merge_patch(&self, id: &str, patch: &QuickTabPatch) -> Option<QuickTabRecord> {
        let mut inner = self.lock_inner();
        let record = inner.records.iter_mut().find(|r| r.id == id)?;
        if record.apply_patch(patch) {
            Some(record.clone())
        } else {
            None
        }
    }

    /// Removes without persisting.
    pub fn merge_remove(&self, id: &str) -> bool {
        let mut inner = self.lock_inner();
        let before = inner.records.len();
        inner.records.retain(|r| r.id != id);
        inner.records.len() != before
    }

    /// Clears without persisting.
    pub fn merge_clear(&self) {
        self.lock_inner().records.clear();
    }

    /// Replaces state with a remote snapshot at record granularity:
    /// upserts changed and new records, deletes records missing remotely.
    /// Last write wins per record; the envelope has no per-field versions.
    pub fn apply_snapshot(&self, records: &[QuickTabRecord]) {
        let mut events = Vec::new();
        {
            let mut inner = self.lock_inner();

            let removed: Vec<String> = inner
                .records
                .iter()
                .filter(|existing| !records.iter().any(|r| r.id == existing.id))
                .map(|r| r.id.clone())
                .collect();
            inner.records.retain(|r| !removed.contains(&r.id));
            for id in removed {
                events.push(StateEvent::Deleted { id });
            }

            for record in records {
                match inner.records.iter_mut().find(|r| r.id == record.id) {
                    Some(existing) => {
                        if existing != record {
                            *existing = record.clone();
                            events.push(StateEvent::Updated {
                                record: record.clone(),
                            });
                        }
                    }
                    None => {
                        inner.records.push(record.clone());
                        events.push(StateEvent::Added {
                            record: record.clone(),
                        });
                    }
                }
            }
        }
        for event in &events {
            self.events.emit(event);
        }
    }

    /// Emits a pre-built merge event. Used by callers of `merge_record`.
    pub fn emit(&self, event: &StateEvent) {
        self.events.emit(event);
    }
}
