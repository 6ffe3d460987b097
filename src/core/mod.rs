//! Runtime core: the event loop and application lifecycle.
//!
//! Internal modules:
//! - [`event_loop`]: coordinates worker results, bus events and cancellation;
//! - [`worker`]: background worker channel plumbing;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`state`]: resources built from a setup recipe;
//! - [`application`]: bootstrapping plus running the loop under the app's logger.

mod application;
mod event_loop;
mod shutdown;
mod state;
mod worker;

pub use application::Application;
pub use event_loop::EventLoop;
pub use shutdown::{cancel_on_shutdown_signal, wait_for_shutdown_signal};
pub use state::State;
pub use worker::{WorkerResult, spawn_worker};
