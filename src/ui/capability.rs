//! # UI capability trait.
//!
//! [`Ui`] is the extension point for renderers (interactive terminal UI, plain log
//! output, test doubles, ...). The event loop drives exactly one active UI through a
//! strict lifecycle:
//!
//! ```text
//! setup(unsubscriber) ──► handle(event)* ──► teardown(force)
//!      (once)               (arrival order)       (once)
//! ```
//!
//! ## Contract
//! - `setup` is called once, before any event; it receives only the
//!   [`Unsubscriber`], never the bus itself. Failing setup makes the collection fall
//!   back to the next candidate.
//! - `handle` is called once per event, in arrival order. Returning
//!   [`UiError::Unsubscribe`] (or calling the unsubscriber) stops event delivery
//!   without being reported as a failure.
//! - `teardown(force)` is called once at shutdown. `force = true` means in-flight
//!   rendering must be abandoned, but resources must still be released.
//! - Implementations must not panic; a panicking UI is a contract violation.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use async_trait::async_trait;
//! use appvisor::{Event, Ui, UiError, Unsubscriber};
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! #[async_trait]
//! impl Ui for Counter {
//!     async fn setup(&self, _unsubscribe: Unsubscriber) -> Result<(), UiError> {
//!         Ok(())
//!     }
//!     async fn handle(&self, _event: &Event) -> Result<(), UiError> {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!         Ok(())
//!     }
//!     async fn teardown(&self, _force: bool) -> Result<(), UiError> {
//!         Ok(())
//!     }
//!     fn name(&self) -> &str { "counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::error::UiError;
use crate::events::{Event, Unsubscriber};

/// Pluggable renderer driven by the event loop.
///
/// Methods take `&self` so that a UI can be shared (`Arc<dyn Ui>`) and so that a
/// UI may hot-swap itself via [`UiCollection::replace`](crate::UiCollection::replace)
/// from inside [`Ui::handle`]. Use interior mutability for state.
#[async_trait]
pub trait Ui: Send + Sync + 'static {
    /// Attaches the UI. Called once, before any event is delivered.
    async fn setup(&self, unsubscribe: Unsubscriber) -> Result<(), UiError>;

    /// Renders a single event.
    async fn handle(&self, event: &Event) -> Result<(), UiError>;

    /// Detaches the UI. Called once at shutdown.
    async fn teardown(&self, force: bool) -> Result<(), UiError>;

    /// Human-readable name (for logs).
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
