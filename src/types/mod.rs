// Quick Tabs shared type definitions
// Each submodule defines types used across the crate.

pub mod envelope;
pub mod errors;
pub mod message;
pub mod panel;
pub mod quick_tab;
