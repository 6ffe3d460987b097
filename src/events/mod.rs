//! Events: types and the publish/subscribe bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish events from workers and deliver them to the active UI.
//!
//! ## Contents
//! - [`EventType`], [`Value`], [`Event`] event classification, payload and metadata
//! - [`Bus`], [`Subscription`], [`Unsubscriber`] fan-out with revocable subscriptions
//!
//! ## Quick reference
//! - **Publishers**: background workers, UIs, the application itself (exit requests).
//! - **Consumer**: the event loop, through exactly one [`Subscription`] per run.

mod bus;
mod event;

pub use bus::{Bus, Subscription, Unsubscriber};
pub use event::{Event, EventError, EventType, ExitRequest, Value};
