use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use quicktabs::managers::panel_controller::{PanelController, PanelRenderer};
use quicktabs::managers::state_store::StateStore;
use quicktabs::types::errors::PanelError;
use quicktabs::types::quick_tab::QuickTabRecord;

fn record(id: &str) -> QuickTabRecord {
    QuickTabRecord::new(id.to_string(), "https://a.com", "title", 1)
}

/// Counts render calls and remembers the last record list it was handed.
struct RecordingRenderer {
    renders: Arc<AtomicUsize>,
    last_ids: Arc<std::sync::Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingRenderer {
    fn new() -> (Box<Self>, Arc<AtomicUsize>, Arc<std::sync::Mutex<Vec<String>>>) {
        let renders = Arc::new(AtomicUsize::new(0));
        let last_ids = Arc::new(std::sync::Mutex::new(Vec::new()));
        let renderer = Box::new(Self {
            renders: Arc::clone(&renders),
            last_ids: Arc::clone(&last_ids),
            fail: false,
        });
        (renderer, renders, last_ids)
    }

    fn failing() -> (Box<Self>, Arc<AtomicUsize>) {
        let renders = Arc::new(AtomicUsize::new(0));
        let renderer = Box::new(Self {
            renders: Arc::clone(&renders),
            last_ids: Arc::new(std::sync::Mutex::new(Vec::new())),
            fail: true,
        });
        (renderer, renders)
    }
}

impl PanelRenderer for RecordingRenderer {
    fn render(&mut self, records: &[QuickTabRecord]) -> Result<(), PanelError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PanelError::RenderFailed("simulated".to_string()));
        }
        *self.last_ids.lock().unwrap() = records.iter().map(|r| r.id.clone()).collect();
        Ok(())
    }
}

#[test]
fn test_closed_panel_defers_refresh() {
    let store = StateStore::new();
    let (renderer, renders, _) = RecordingRenderer::new();
    let panel = PanelController::new(renderer);
    let _sub = panel.attach(&store);

    store.add(record("qt-1"));
    store.add(record("qt-2"));

    assert_eq!(renders.load(Ordering::SeqCst), 0);
    assert!(panel.pending_refresh());
    assert!(!panel.is_open());
}

#[test]
fn test_open_with_pending_refreshes_exactly_once() {
    let store = StateStore::new();
    let (renderer, renders, last_ids) = RecordingRenderer::new();
    let panel = PanelController::new(renderer);
    let _sub = panel.attach(&store);

    store.add(record("qt-1"));
    store.add(record("qt-2"));
    panel.open(&store);

    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(last_ids.lock().unwrap().len(), 2);
    assert!(!panel.pending_refresh());
}

#[test]
fn test_open_without_pending_skips_render() {
    let store = StateStore::new();
    let (renderer, renders, _) = RecordingRenderer::new();
    let panel = PanelController::new(renderer);
    let _sub = panel.attach(&store);

    panel.open(&store);
    assert_eq!(renders.load(Ordering::SeqCst), 0);
}

#[test]
fn test_open_panel_refreshes_on_every_event() {
    let store = StateStore::new();
    let (renderer, renders, _) = RecordingRenderer::new();
    let panel = PanelController::new(renderer);
    let _sub = panel.attach(&store);

    panel.open(&store);
    store.add(record("qt-1"));
    store.add(record("qt-2"));
    store.remove("qt-1");

    assert_eq!(renders.load(Ordering::SeqCst), 3);
    assert!(!panel.pending_refresh());
}

#[test]
fn test_close_then_reopen_cycle() {
    let store = StateStore::new();
    let (renderer, renders, last_ids) = RecordingRenderer::new();
    let panel = PanelController::new(renderer);
    let _sub = panel.attach(&store);

    panel.open(&store);
    store.add(record("qt-1"));
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    panel.close();
    store.add(record("qt-2"));
    store.add(record("qt-3"));
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    panel.open(&store);
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(last_ids.lock().unwrap().len(), 3);
}

#[test]
fn test_force_refresh_ignores_gating() {
    let store = StateStore::new();
    store.add(record("qt-1"));
    let (renderer, renders, _) = RecordingRenderer::new();
    let panel = PanelController::new(renderer);

    assert!(!panel.is_open());
    panel.force_refresh(&store);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert!(!panel.pending_refresh());
}

#[test]
fn test_render_failure_does_not_clear_state() {
    let store = StateStore::new();
    let (renderer, renders) = RecordingRenderer::failing();
    let panel = PanelController::new(renderer);
    let _sub = panel.attach(&store);

    panel.open(&store);
    store.add(record("qt-1"));

    // The failure is swallowed; the panel stays open and usable.
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert!(panel.is_open());
    store.add(record("qt-2"));
    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

/// Panics on the first render, succeeds afterwards.
struct PanickingRenderer {
    calls: Arc<AtomicUsize>,
}

impl PanelRenderer for PanickingRenderer {
    fn render(&mut self, _records: &[QuickTabRecord]) -> Result<(), PanelError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("render blew up");
        }
        Ok(())
    }
}

#[test]
fn test_renderer_panic_does_not_disable_panel() {
    let store = StateStore::new();
    store.add(record("qt-1"));
    let calls = Arc::new(AtomicUsize::new(0));
    let panel = PanelController::new(Box::new(PanickingRenderer {
        calls: Arc::clone(&calls),
    }));

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        panel.force_refresh(&store);
    }));
    assert!(outcome.is_err());

    // The panel keeps working; the next refresh reaches the renderer.
    panel.force_refresh(&store);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_renderer_may_query_controller_during_render() {
    struct QueryingRenderer {
        panel: Arc<std::sync::Mutex<Option<PanelController>>>,
        observed_open: Arc<AtomicUsize>,
    }

    impl PanelRenderer for QueryingRenderer {
        fn render(&mut self, _records: &[QuickTabRecord]) -> Result<(), PanelError> {
            // Re-querying the open flag mid-render must not deadlock.
            if let Some(panel) = self.panel.lock().unwrap().as_ref() {
                if panel.is_open() {
                    self.observed_open.fetch_add(1, Ordering::SeqCst);
                }
            }
            Ok(())
        }
    }

    let store = StateStore::new();
    store.add(record("qt-1"));
    let slot = Arc::new(std::sync::Mutex::new(None));
    let observed_open = Arc::new(AtomicUsize::new(0));
    let panel = PanelController::new(Box::new(QueryingRenderer {
        panel: Arc::clone(&slot),
        observed_open: Arc::clone(&observed_open),
    }));
    *slot.lock().unwrap() = Some(panel.clone());
    let _sub = panel.attach(&store);

    panel.open(&store);
    store.add(record("qt-2"));

    assert_eq!(observed_open.load(Ordering::SeqCst), 1);
}

#[test]
fn test_events_update_last_update_timestamp() {
    let store = StateStore::new();
    let (renderer, _, _) = RecordingRenderer::new();
    let panel = PanelController::new(renderer);
    let _sub = panel.attach(&store);

    assert_eq!(panel.view_state().last_update_timestamp, 0);
    store.add(record("qt-1"));
    assert!(panel.view_state().last_update_timestamp > 0);
}

#[test]
fn test_detached_panel_sees_no_events() {
    let store = StateStore::new();
    let (renderer, renders, _) = RecordingRenderer::new();
    let panel = PanelController::new(renderer);
    panel.open(&store);

    {
        let _sub = panel.attach(&store);
        store.add(record("qt-1"));
    }
    // Subscription dropped: later events no longer reach the panel.
    store.add(record("qt-2"));

    assert_eq!(renders.load(Ordering::SeqCst), 1);
}
