//! # appvisor
//!
//! **Appvisor** bootstraps command-line applications: it builds an event bus,
//! a logger and a set of candidate UIs from a recipe, then runs one coordinating
//! event loop that waits for a background worker while rendering its events.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   SetupConfig ──► Application::new ──► State
//!                                         ├─ Bus ──► Subscription
//!                                         ├─ logger (tracing Dispatch)
//!                                         └─ UIs  ──► UiCollection
//!
//!  ┌────────────┐  Result<(), BoxError>  ┌───────────────────────────────┐
//!  │   worker   │ ─────────────────────► │           EventLoop           │
//!  │ (spawned)  │                        │  select! { worker, events,    │
//!  └─────┬──────┘                        │            token.cancelled }  │
//!        │ publish(Event)                └──────────────┬────────────────┘
//!        ▼                                              │ handle(&Event)
//!  ┌────────────┐   Subscription (FIFO)                 ▼
//!  │    Bus     │ ───────────────────────────►  UiCollection (≤ 1 active UI)
//!  └────────────┘                                       │ teardown(force)
//!                                                       ▼
//!                                               Result<(), RunError>
//! ```
//!
//! ### Lifecycle
//! ```text
//! UiCollection::setup(unsubscriber)     first candidate that sets up wins
//! loop {
//!   ├─ worker Ok(())        ─► ignore
//!   ├─ worker Err(e)        ─► record, unsubscribe, force teardown
//!   ├─ worker closed        ─► stop watching the worker
//!   ├─ event                ─► ui.handle(event)
//!   │     ├─ Err(Unsubscribe) ─► stop watching the bus
//!   │     ├─ Err(e)           ─► record
//!   │     └─ exit event       ─► unsubscribe (interrupt ⇒ drop queue, force teardown)
//!   ├─ bus closed           ─► stop watching the bus
//!   └─ token cancelled      ─► stop now, force teardown
//! } while worker or bus is still watched
//! UiCollection::teardown(force)         error recorded as well
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                           |
//! |-------------------|----------------------------------------------------------|----------------------------------------------|
//! | **Event loop**    | Coordinates worker, bus and cancellation.                | [`EventLoop`], [`spawn_worker`]              |
//! | **UIs**           | Pluggable renderers with fallback and hot replacement.   | [`Ui`], [`UiCollection`], [`LogUi`]          |
//! | **Events**        | In-process pub/sub with revocable subscriptions.         | [`Bus`], [`Event`], [`Unsubscriber`]         |
//! | **Bootstrapping** | Build bus, logger and UIs from a recipe.                 | [`Application`], [`SetupConfig`], [`State`] |
//! | **Configuration** | Identity and logging level selection.                    | [`Config`], [`LoggingConfig`]                |
//! | **Errors**        | Typed errors; every loop failure is kept.                | [`RunError`], [`UiError`], [`SetupError`]    |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use appvisor::{Application, Event, Identification, LogUi, SetupConfig, Ui, spawn_worker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let setup = SetupConfig::new(Identification::new("fetch", "0.3.1"))
//!         .with_ui(|_| Ok(vec![Arc::new(LogUi::new()) as Arc<dyn Ui>]));
//!     let app = Application::new(setup)?;
//!
//!     let bus = app.bus().cloned().expect("bus");
//!     let worker = spawn_worker(async move {
//!         for n in 1..=3_i64 {
//!             bus.publish(Event::new("fetched").with_value(n));
//!         }
//!         bus.publish(Event::exit(false));
//!         Ok(())
//!     });
//!
//!     app.run_until_signal(worker).await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod ui;

#[cfg(test)]
mod testsupport;

// ---- Public re-exports ----

pub use config::{
    BusConstructor, Config, Identification, Initializer, LoggerConstructor, LoggingConfig,
    SetupConfig, TerminalProbe, UiConstructor, default_logger, parse_level,
};
pub use core::{
    Application, EventLoop, State, WorkerResult, cancel_on_shutdown_signal, spawn_worker,
    wait_for_shutdown_signal,
};
pub use error::{BoxError, LoopFailure, ReplaceError, RunError, SetupError, UiError};
pub use events::{Bus, Event, EventError, EventType, ExitRequest, Subscription, Unsubscriber, Value};
pub use ui::{LogUi, Ui, UiCollection};
