//! # Event bus with revocable subscriptions.
//!
//! [`Bus`] fans each published [`Event`] out to every live [`Subscription`]. Each
//! subscription owns an unbounded FIFO queue, so a slow reader never loses events
//! and never blocks the publisher.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                     Subscriptions (many):
//!   worker ──┐                          ┌──► [queue 1] ──► Subscription::recv()
//!   ui     ──┼──► Bus::publish(Event) ──┼──► [queue 2] ──► Subscription::recv()
//!   app    ──┘    (clone per queue)     └──► [queue N] ──► Subscription::recv()
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never awaits.
//! - **Per-subscription FIFO**: publishes are serialized, so every subscription
//!   observes the same relative order.
//! - **No replay**: a subscription only sees events published after it was created.
//! - **Revocable**: [`Unsubscriber::unsubscribe`] detaches the queue; already queued
//!   events are still delivered, then the stream ends.
//! - **Close**: [`Bus::close`] ends every subscription the same way.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;

use super::event::Event;

#[derive(Debug, Default)]
struct Registry {
    state: Mutex<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    next_id: u64,
    closed: bool,
    senders: HashMap<u64, mpsc::UnboundedSender<Event>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process publish/subscribe channel.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Unbounded**: each subscription buffers without limit.
/// - **Cloneable**: cheap to clone (`Arc`-backed); all clones share subscribers.
#[derive(Clone, Debug, Default)]
pub struct Bus {
    registry: Arc<Registry>,
}

impl Bus {
    /// Creates a new bus without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes an event to all live subscriptions.
    ///
    /// Subscriptions whose receiving side was dropped are pruned.
    pub fn publish(&self, ev: Event) {
        let mut state = self.registry.lock();
        state.senders.retain(|_, tx| tx.send(ev.clone()).is_ok());
    }

    /// Creates a new subscription that observes subsequent events.
    ///
    /// After [`Bus::close`] the returned subscription is already closed.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.registry.lock();
        let id = state.next_id;
        state.next_id += 1;
        if !state.closed {
            state.senders.insert(id, tx);
        }
        Subscription {
            events: rx,
            unsubscriber: Unsubscriber {
                target: Some((id, Arc::downgrade(&self.registry))),
            },
        }
    }

    /// Ends every live subscription and rejects new ones.
    pub fn close(&self) {
        let mut state = self.registry.lock();
        state.closed = true;
        state.senders.clear();
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().senders.len()
    }

    /// True once [`Bus::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.registry.lock().closed
    }
}

/// Capability to detach one subscription from its bus.
///
/// Cloneable and idempotent. This is the only bus access handed to a UI.
#[derive(Clone, Debug)]
pub struct Unsubscriber {
    target: Option<(u64, Weak<Registry>)>,
}

impl Unsubscriber {
    /// An unsubscriber bound to no bus (used for runs without a bus); always a no-op.
    pub fn detached() -> Self {
        Self { target: None }
    }

    /// Detaches the subscription.
    ///
    /// Returns `true` only for the call that actually detached it.
    pub fn unsubscribe(&self) -> bool {
        let Some((id, registry)) = &self.target else {
            return false;
        };
        match registry.upgrade() {
            Some(registry) => registry.lock().senders.remove(id).is_some(),
            None => false,
        }
    }

    /// True if this unsubscriber is bound to no bus.
    pub fn is_detached(&self) -> bool {
        self.target.is_none()
    }
}

/// A live, ordered stream of events from one [`Bus`].
///
/// Finite only once unsubscribed (or the bus is closed/dropped).
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<Event>,
    unsubscriber: Unsubscriber,
}

impl Subscription {
    /// Receives the next event; `None` once the subscription is closed and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Returns a cloneable unsubscribe capability for this subscription.
    pub fn unsubscriber(&self) -> Unsubscriber {
        self.unsubscriber.clone()
    }

    /// Detaches this subscription (idempotent).
    pub fn unsubscribe(&self) -> bool {
        self.unsubscriber.unsubscribe()
    }

    /// True if this subscription was taken from `bus` (or one of its clones).
    pub fn is_from(&self, bus: &Bus) -> bool {
        match &self.unsubscriber.target {
            Some((_, registry)) => std::ptr::eq(registry.as_ptr(), Arc::as_ptr(&bus.registry)),
            None => false,
        }
    }

    /// Splits into the raw event receiver and the unsubscribe capability.
    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<Event>, Unsubscriber) {
        (self.events, self.unsubscriber)
    }
}
