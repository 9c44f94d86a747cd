//! Panel Presentation Controller.
//!
//! Owns the management panel's open/closed state and decides when the
//! rendered list must refresh. While the panel is closed, state events only
//! set `pending_refresh`; reopening acts on the flag with exactly one
//! refresh. While open, every state event refreshes immediately. The
//! authoritative open flag lives here and nowhere else; callers must
//! re-query it instead of caching.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::managers::state_store::StateStore;
use crate::services::event_bus::Subscription;
use crate::types::errors::PanelError;
use crate::types::panel::PanelViewState;
use crate::types::quick_tab::QuickTabRecord;

/// Seam to the presentation module that materializes the panel's DOM
/// subtree. Treated as a pure function of the record list.
pub trait PanelRenderer: Send {
    fn render(&mut self, records: &[QuickTabRecord]) -> Result<(), PanelError>;
}

struct PanelInner {
    view: PanelViewState,
    /// Taken while a render is in flight; a re-entrant refresh finds the
    /// slot empty and collapses into the outer call.
    renderer: Option<Box<dyn PanelRenderer>>,
}

/// Cloneable handle so store event listeners can reach the controller.
#[derive(Clone)]
pub struct PanelController {
    inner: Arc<Mutex<PanelInner>>,
}

impl PanelController {
    pub fn new(renderer: Box<dyn PanelRenderer>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PanelInner {
                view: PanelViewState::default(),
                renderer: Some(renderer),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    /// Subscribes to the store's state events. The caller keeps the handle
    /// alive for as long as the panel should track changes.
    pub fn attach(&self, store: &StateStore) -> Subscription {
        let controller = self.clone();
        let bus = store.events().clone();
        let store = store.clone();
        bus.on(move |_event| {
            controller.on_state_event(&store);
        })
    }

    /// Reacts to one state change: refresh when open, defer when closed.
    pub fn on_state_event(&self, store: &StateStore) {
        let is_open = {
            let mut inner = self.lock();
            inner.view.last_update_timestamp = Self::now_ms();
            if !inner.view.is_open {
                inner.view.pending_refresh = true;
            }
            inner.view.is_open
        };
        if is_open {
            self.refresh(store);
        }
    }

    /// Authoritative open flag. Other holders are read-only projections and
    /// must call this on every query.
    pub fn is_open(&self) -> bool {
        self.lock().view.is_open
    }

    pub fn pending_refresh(&self) -> bool {
        self.lock().view.pending_refresh
    }

    /// Diagnostic snapshot of the view state.
    pub fn view_state(&self) -> PanelViewState {
        self.lock().view.clone()
    }

    /// Opens the panel. Refreshes only if changes were missed while closed;
    /// an unchanged list needs no re-render since closed panels never skip
    /// events, they just defer acting on them.
    pub fn open(&self, store: &StateStore) {
        let needs_refresh = {
            let mut inner = self.lock();
            inner.view.is_open = true;
            let pending = inner.view.pending_refresh;
            inner.view.pending_refresh = false;
            pending
        };
        if needs_refresh {
            self.refresh(store);
        }
    }

    /// Closes the panel; future state events set `pending_refresh` instead
    /// of rendering.
    pub fn close(&self) {
        self.lock().view.is_open = false;
    }

    /// Renders regardless of open/closed gating; used for actions that must
    /// show visible confirmation, like clearing all storage.
    pub fn force_refresh(&self, store: &StateStore) {
        self.refresh(store);
        self.lock().view.pending_refresh = false;
    }

    /// Materializes the list. A renderer failure is logged and the
    /// previously rendered content stays in place; stale beats blank.
    ///
    /// The renderer runs outside the controller lock, so it may re-query
    /// `is_open()` without deadlocking. The slot guard puts the renderer
    /// back even if it unwinds, keeping the panel usable afterwards.
    fn refresh(&self, store: &StateStore) {
        let Some(renderer) = self.lock().renderer.take() else {
            return;
        };
        let records = store.get_all();
        let mut slot = RendererSlot {
            controller: self,
            renderer: Some(renderer),
        };
        let result = slot.renderer.as_mut().map(|r| r.render(&records));
        drop(slot);
        if let Some(Err(e)) = result {
            warn!(error = %e, "panel refresh failed; keeping previous content");
        }
    }
}

/// Returns a taken renderer to its controller on drop, unwinding included.
struct RendererSlot<'a> {
    controller: &'a PanelController,
    renderer: Option<Box<dyn PanelRenderer>>,
}

impl Drop for RendererSlot<'_> {
    fn drop(&mut self) {
        self.controller.lock().renderer = self.renderer.take();
    }
}
