//! # Pluggable UIs for the event loop.
//!
//! This module provides the [`Ui`] capability trait, the [`UiCollection`] that picks
//! and hot-swaps the active UI, and a built-in [`LogUi`].
//!
//! ## Architecture
//! ```text
//! Bus ──► Subscription ──► EventLoop ──► UiCollection::handle(&Event)
//!                                              │
//!                                         active UI (at most one)
//!                                              │
//!                           ┌──────────────────┼──────────────────┐
//!                           ▼                  ▼                  ▼
//!                      Terminal UI          LogUi            Custom UI
//!                   (first choice)       (fallback)        (user logic)
//! ```

mod capability;
mod collection;
mod log;

pub use capability::Ui;
pub use collection::UiCollection;
pub use log::LogUi;
