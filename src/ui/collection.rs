//! # UiCollection: first-success fallback over UI candidates
//!
//! [`UiCollection`] holds an ordered list of [`Ui`] candidates and at most one
//! *active* member. It is itself what the event loop drives.
//!
//! ## Rules
//! - **First success wins**: `setup` tries candidates in declared order; the first
//!   whose `setup` succeeds becomes active, later candidates are never attempted.
//! - **Headless is valid**: if every candidate fails, nothing is active; `handle`
//!   and `teardown` become no-ops. Individual setup failures are logged, never returned.
//! - **Hot replacement**: [`UiCollection::replace`] tears down the active UI
//!   (`force = false`) and sets up the replacement with the unsubscriber captured at
//!   the initial `setup`.
//! - **Reentrant**: no lock is held while a UI method runs, so a UI may call
//!   `replace` from inside its own `handle`.
//! - Concurrent `replace` calls need external synchronization.
//!
//! ## Diagram
//! ```text
//! setup(unsub)
//!     ├─► A.setup ✗ (warn) ─► B.setup ✓ ─► active = B      (C never attempted)
//!
//! replace(D)
//!     ├─► B.teardown(false) ✗ ─► Err(Teardown)      active stays B
//!     └─► B.teardown(false) ✓ ─► D.setup(unsub) ✗ ─► Err(Setup)   active = none
//!                                               ✓ ─► active = D
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::Ui;
use crate::error::{ReplaceError, UiError};
use crate::events::{Event, Unsubscriber};

#[derive(Default)]
struct Slots {
    candidates: Vec<Arc<dyn Ui>>,
    active: Option<Arc<dyn Ui>>,
    unsubscriber: Option<Unsubscriber>,
}

/// Ordered UI candidates with at most one active member.
///
/// Cheap to clone; clones share the same active slot (hand one to a UI that needs
/// to replace itself).
#[derive(Clone, Default)]
pub struct UiCollection {
    slots: Arc<Mutex<Slots>>,
}

impl UiCollection {
    /// Creates a collection from candidates in priority order.
    pub fn new(candidates: Vec<Arc<dyn Ui>>) -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                candidates,
                ..Slots::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Activates the first candidate whose `setup` succeeds.
    ///
    /// Never fails: if no candidate can be set up the collection stays headless.
    pub async fn setup(&self, unsubscribe: Unsubscriber) {
        let candidates = {
            let mut slots = self.lock();
            slots.unsubscriber = Some(unsubscribe.clone());
            slots.candidates.clone()
        };

        for ui in candidates {
            match ui.setup(unsubscribe.clone()).await {
                Ok(()) => {
                    debug!(ui = ui.name(), "ui activated");
                    self.lock().active = Some(ui);
                    return;
                }
                Err(err) => {
                    warn!(
                        ui = ui.name(),
                        error = %err,
                        "unable to setup given UI, falling back to alternative UI"
                    );
                }
            }
        }
        debug!("no ui activated; running headless");
    }

    /// Forwards an event to the active UI; no-op when headless.
    pub async fn handle(&self, event: &Event) -> Result<(), UiError> {
        match self.active() {
            Some(ui) => ui.handle(event).await,
            None => Ok(()),
        }
    }

    /// Tears down the active UI; no-op when headless.
    pub async fn teardown(&self, force: bool) -> Result<(), UiError> {
        match self.active() {
            Some(ui) => ui.teardown(force).await,
            None => Ok(()),
        }
    }

    /// Swaps the active UI for `replacement`.
    ///
    /// ### Failure semantics
    /// - current teardown fails → [`ReplaceError::Teardown`]; `replacement` is never
    ///   set up and the old UI stays referenced as active.
    /// - replacement setup fails → [`ReplaceError::Setup`]; nothing is active.
    pub async fn replace(&self, replacement: Arc<dyn Ui>) -> Result<(), ReplaceError> {
        let (current, unsubscribe) = {
            let slots = self.lock();
            (slots.active.clone(), slots.unsubscriber.clone())
        };

        if let Some(current) = current {
            current
                .teardown(false)
                .await
                .map_err(|e| ReplaceError::Teardown(Box::new(e)))?;
            self.lock().active = None;
        }

        let unsubscribe = unsubscribe.unwrap_or_else(Unsubscriber::detached);
        replacement
            .setup(unsubscribe)
            .await
            .map_err(|e| ReplaceError::Setup(Box::new(e)))?;

        debug!(ui = replacement.name(), "ui replaced");
        self.lock().active = Some(replacement);
        Ok(())
    }

    /// The active UI, if any.
    pub fn active(&self) -> Option<Arc<dyn Ui>> {
        self.lock().active.clone()
    }

    /// True when no UI is active.
    pub fn is_headless(&self) -> bool {
        self.lock().active.is_none()
    }

    /// Number of declared candidates.
    pub fn len(&self) -> usize {
        self.lock().candidates.len()
    }

    /// True when no candidates were declared.
    pub fn is_empty(&self) -> bool {
        self.lock().candidates.is_empty()
    }
}

impl From<Vec<Arc<dyn Ui>>> for UiCollection {
    fn from(candidates: Vec<Arc<dyn Ui>>) -> Self {
        Self::new(candidates)
    }
}

impl fmt::Debug for UiCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.lock();
        f.debug_struct("UiCollection")
            .field(
                "candidates",
                &slots.candidates.iter().map(|u| u.name()).collect::<Vec<_>>(),
            )
            .field("active", &slots.active.as_ref().map(|u| u.name()))
            .finish()
    }
}
