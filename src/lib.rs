//! Quick Tabs — cross-tab state synchronization core for floating
//! mini-browser overlays.
//!
//! This library crate exposes all modules for use by the binary and
//! integration tests.

pub mod app;
pub mod managers;
pub mod services;
pub mod timing;
pub mod types;
