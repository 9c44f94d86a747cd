//! Quick Tabs demo binary.
//!
//! Walks two simulated browser tabs through the full sync cycle: create,
//! persist, reconcile the storage change on the other tab, broadcast
//! geometry, and exercise the management panel.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::oneshot;

use quicktabs::app::{QuickTabsApp, RuntimeContext};
use quicktabs::managers::panel_controller::PanelRenderer;
use quicktabs::services::background::BackgroundTransport;
use quicktabs::services::storage_area::{MemoryStorageArea, StorageArea};
use quicktabs::types::envelope::QUICK_TABS_STORAGE_KEY;
use quicktabs::types::errors::{MessageError, PanelError};
use quicktabs::types::message::Message;
use quicktabs::types::quick_tab::{Position, QuickTabRecord};

struct ConsoleRenderer {
    label: &'static str,
}

impl PanelRenderer for ConsoleRenderer {
    fn render(&mut self, records: &[QuickTabRecord]) -> Result<(), PanelError> {
        println!("  [{} panel] rendering {} quick tab(s)", self.label, records.len());
        for record in records {
            println!(
                "    - {} ({}) origin tab {}{}",
                record.title,
                record.url,
                record.origin_tab_id,
                if record.visibility.minimized { " [minimized]" } else { "" }
            );
        }
        Ok(())
    }
}

struct EchoTransport;

impl BackgroundTransport for EchoTransport {
    fn send(&self, message: &Message) -> oneshot::Receiver<Result<Value, MessageError>> {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(json!({ "ok": true, "correlationId": message.correlation_id })));
        rx
    }
}

fn section(name: &str) {
    println!();
    println!("--- {} ---", name);
}

#[tokio::main]
async fn main() {
    println!("Quick Tabs v{} — sync core demo", env!("CARGO_PKG_VERSION"));

    let storage: Arc<dyn StorageArea> = Arc::new(MemoryStorageArea::new());

    let mut tab_a = QuickTabsApp::new(
        RuntimeContext::new(1),
        Arc::clone(&storage),
        Box::new(ConsoleRenderer { label: "tab A" }),
    );
    let mut tab_b = QuickTabsApp::new(
        RuntimeContext::new(2),
        Arc::clone(&storage),
        Box::new(ConsoleRenderer { label: "tab B" }),
    );
    tab_a.set_background_transport(Arc::new(EchoTransport));
    tab_a.startup();
    tab_b.startup();

    section("create in tab A");
    let created = tab_a.create_quick_tab("https://example.com/article", "Example article");
    println!("  outbound message: {:?}", created.message_type);
    println!("  tab A store count: {}", tab_a.store.count());

    section("storage change reaches tab B");
    let raw = storage
        .get(QUICK_TABS_STORAGE_KEY)
        .ok()
        .flatten()
        .unwrap_or(Value::Null);
    let disposition = tab_b.handle_storage_change(&raw);
    println!("  disposition: {:?}", disposition);
    println!("  tab B store count: {}", tab_b.store.count());
    println!("  tab B visible (origin-filtered): {}", tab_b.visible_records().len());
    println!("  tab B panel counts: {:?}", tab_b.panel_counts());

    section("self-echo suppressed in tab A");
    let echo = tab_a.handle_storage_change(&raw);
    println!("  disposition: {:?}", echo);

    section("broadcast geometry to tab B");
    let id = created.quick_tab_id.clone().unwrap_or_default();
    let drag = Message::position_changed(&id, Position { left: 120.0, top: 48.0 });
    println!("  disposition: {:?}", tab_b.handle_broadcast(&drag));

    section("management panel in tab B");
    tab_b.panel.open(&tab_b.store);
    println!("  panel open: {}", tab_b.panel.is_open());
    tab_b.panel.close();
    if let Some(nav) = tab_a.navigate_quick_tab(&id, "https://example.com/next", "Next page") {
        tab_b.handle_broadcast(&nav);
    }
    println!("  pending refresh while closed: {}", tab_b.panel.pending_refresh());

    section("focus origin tab via background");
    match tab_a.focus_origin_tab(&id).await {
        Ok(response) => println!("  background response: {}", response),
        Err(e) => println!("  background error: {}", e),
    }

    section("bulk close");
    let _ = tab_a.close_all();
    println!("  tab A store count: {}", tab_a.store.count());

    tab_a.shutdown();
    tab_b.shutdown();
    println!();
    println!("Done.");
}
