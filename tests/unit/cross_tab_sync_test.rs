//! End-to-end scenarios across two app instances sharing one storage area,
//! simulating two browser tabs.

use std::sync::Arc;

use quicktabs::app::{QuickTabsApp, RuntimeContext};
use quicktabs::managers::panel_controller::PanelRenderer;
use quicktabs::managers::reconciler::SignalDisposition;
use quicktabs::services::storage_area::{MemoryStorageArea, StorageArea};
use quicktabs::types::envelope::QUICK_TABS_STORAGE_KEY;
use quicktabs::types::errors::PanelError;
use quicktabs::types::message::Message;
use quicktabs::types::quick_tab::{Position, QuickTabRecord};

struct NullRenderer;

impl PanelRenderer for NullRenderer {
    fn render(&mut self, _records: &[QuickTabRecord]) -> Result<(), PanelError> {
        Ok(())
    }
}

fn app(tab_id: i64, storage: &Arc<MemoryStorageArea>) -> QuickTabsApp {
    QuickTabsApp::new(
        RuntimeContext::new(tab_id),
        Arc::clone(storage) as Arc<dyn StorageArea>,
        Box::new(NullRenderer),
    )
}

/// Reads what the writer app just persisted, as another tab's storage
/// change listener would see it.
fn persisted(storage: &MemoryStorageArea) -> serde_json::Value {
    storage.get(QUICK_TABS_STORAGE_KEY).unwrap().unwrap()
}

#[test]
fn test_create_propagates_via_storage_change() {
    let storage = Arc::new(MemoryStorageArea::new());
    let tab_a = app(1, &storage);
    let tab_b = app(2, &storage);

    tab_a.create_quick_tab("https://x.com", "X");
    let disposition = tab_b.handle_storage_change(&persisted(&storage));

    assert_eq!(disposition, SignalDisposition::Applied);
    // Tab B's store knows the record but does not materialize it: the
    // overlay only ever renders in its origin tab.
    assert_eq!(tab_b.store.count(), 1);
    assert!(tab_b.visible_records().is_empty());
    assert_eq!(tab_b.panel_counts().total, 1);
}

#[test]
fn test_own_storage_echo_is_suppressed() {
    let storage = Arc::new(MemoryStorageArea::new());
    let tab_a = app(1, &storage);

    tab_a.create_quick_tab("https://x.com", "X");
    let count_before = tab_a.store.count();

    // The browser also notifies the writer's own context of the change.
    let disposition = tab_a.handle_storage_change(&persisted(&storage));

    assert_eq!(disposition, SignalDisposition::SelfEcho);
    assert_eq!(tab_a.store.count(), count_before);
}

#[test]
fn test_close_propagates_via_broadcast() {
    let storage = Arc::new(MemoryStorageArea::new());
    let tab_a = app(1, &storage);
    let tab_b = app(2, &storage);

    let created = tab_a.create_quick_tab("https://x.com", "X");
    tab_b.handle_broadcast(&created);
    assert_eq!(tab_b.store.count(), 1);

    let id = created.quick_tab_id.clone().unwrap();
    let closed = tab_a.close_quick_tab(&id).unwrap();
    let disposition = tab_b.handle_broadcast(&closed);

    assert_eq!(disposition, SignalDisposition::Applied);
    assert_eq!(tab_b.store.count(), 0);
}

#[test]
fn test_geometry_change_propagates() {
    let storage = Arc::new(MemoryStorageArea::new());
    let tab_a = app(1, &storage);
    let tab_b = app(2, &storage);

    let created = tab_a.create_quick_tab("https://x.com", "X");
    tab_b.handle_broadcast(&created);

    let id = created.quick_tab_id.clone().unwrap();
    let moved = tab_a
        .move_quick_tab(&id, Position { left: 120.0, top: 40.0 })
        .unwrap();
    tab_b.handle_broadcast(&moved);

    let record = tab_b.store.get_by_id(&id).unwrap();
    assert_eq!(record.position.left, 120.0);
    assert_eq!(record.position.top, 40.0);
}

#[test]
fn test_startup_hydrates_only_own_records() {
    let storage = Arc::new(MemoryStorageArea::new());
    let tab_a = app(1, &storage);
    tab_a.create_quick_tab("https://x.com", "X");
    tab_a.create_quick_tab("https://y.com", "Y");

    // A fresh instance in the same browser tab picks its records back up.
    let mut revived_a = app(1, &storage);
    revived_a.startup();
    assert_eq!(revived_a.store.count(), 2);
    assert_eq!(revived_a.visible_records().len(), 2);

    // A different tab hydrates none of them.
    let mut tab_b = app(2, &storage);
    tab_b.startup();
    assert_eq!(tab_b.store.count(), 0);
}

#[test]
fn test_startup_with_empty_storage_starts_empty() {
    let storage = Arc::new(MemoryStorageArea::new());
    let mut tab_a = app(1, &storage);
    tab_a.startup();
    assert_eq!(tab_a.store.count(), 0);
}

#[test]
fn test_startup_with_garbage_storage_starts_empty() {
    let storage = Arc::new(MemoryStorageArea::new());
    storage
        .set(QUICK_TABS_STORAGE_KEY, serde_json::json!({"what": "ever"}))
        .unwrap();

    let mut tab_a = app(1, &storage);
    tab_a.startup();
    assert_eq!(tab_a.store.count(), 0);
}

#[test]
fn test_close_all_clears_every_tab() {
    let storage = Arc::new(MemoryStorageArea::new());
    let tab_a = app(1, &storage);
    let tab_b = app(2, &storage);

    let created = tab_a.create_quick_tab("https://x.com", "X");
    tab_b.handle_broadcast(&created);
    tab_b.create_quick_tab("https://y.com", "Y");

    let close_all = tab_a.close_all();
    tab_b.handle_broadcast(&close_all);

    assert_eq!(tab_a.store.count(), 0);
    assert_eq!(tab_b.store.count(), 0);
}

#[test]
fn test_legacy_envelope_without_timestamp_still_applies() {
    let storage = Arc::new(MemoryStorageArea::new());
    let tab_a = app(1, &storage);
    let tab_b = app(2, &storage);

    // Tab B has already applied a current-format signal.
    tab_a.create_quick_tab("https://x.com", "X");
    assert_eq!(
        tab_b.handle_storage_change(&persisted(&storage)),
        SignalDisposition::Applied
    );

    // A legacy writer re-saves in the containers shape, with no saveId or
    // timestamp. It must still reconcile, not be discarded as stale.
    let legacy_tab =
        serde_json::to_value(QuickTabRecord::new("qt-legacy".to_string(), "https://y.com", "Y", 1))
            .unwrap();
    let legacy = serde_json::json!({
        "containers": { "firefox-default": { "tabs": [legacy_tab] } }
    });
    let disposition = tab_b.handle_storage_change(&legacy);

    assert_eq!(disposition, SignalDisposition::Applied);
    assert!(tab_b.store.get_by_id("qt-legacy").is_some());
}

#[test]
fn test_invalid_storage_change_is_discarded() {
    let storage = Arc::new(MemoryStorageArea::new());
    let tab_a = app(1, &storage);

    let disposition = tab_a.handle_storage_change(&serde_json::json!(null));
    assert_eq!(disposition, SignalDisposition::Invalid);
    assert_eq!(tab_a.store.count(), 0);
}

#[test]
fn test_unknown_broadcast_target_is_tolerated() {
    let storage = Arc::new(MemoryStorageArea::new());
    let tab_b = app(2, &storage);

    // Closing a record the receiver never knew about must not fail.
    let disposition = tab_b.handle_broadcast(&Message::closed("never-seen"));
    assert_eq!(disposition, SignalDisposition::Applied);
    assert_eq!(tab_b.store.count(), 0);
}
