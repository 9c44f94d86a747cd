// Quick Tabs state managers
// Managers own the stateful core: the live store, the cross-tab
// reconciler, the panel presentation controller, and origin filtering.

pub mod origin_filter;
pub mod panel_controller;
pub mod reconciler;
pub mod state_store;
