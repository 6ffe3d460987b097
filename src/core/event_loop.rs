//! # EventLoop: coordinates worker completion, bus events and cancellation.
//!
//! The [`EventLoop`] owns one [`Subscription`] for the duration of a run, drives the
//! active UI of a [`UiCollection`], and decides when and how to stop.
//!
//! ## Sources
//! ```text
//!   worker ── Result<(), BoxError> ──┐
//!   bus    ── Event ─────────────────┼──► select! ──► UiCollection::handle(&Event)
//!   token  ── cancelled() ───────────┘         │
//!                                              └──► UiCollection::teardown(force)
//! ```
//!
//! ## States
//! ```text
//! RUNNING ──(one source exhausted)──► DRAINING ──(both exhausted)──► STOPPED
//!    └───────────────────(token cancelled)───────────────────────────┘
//! ```
//!
//! ## Rules
//! - **Worker `Ok(())`**: heartbeat, ignored.
//! - **Worker `Err(e)`**: recorded, the subscription is unsubscribed (graceful stop),
//!   teardown becomes forced.
//! - **Event**: forwarded to the active UI (dropped when headless). The
//!   [`UiError::Unsubscribe`] sentinel exhausts the event source; any other error is
//!   recorded without forcing teardown.
//! - **Exit event**: forwarded, then the subscription is unsubscribed. A graceful
//!   exit drains events already queued; an interrupt exit drops them and forces
//!   teardown.
//! - **Cancellation**: both sources are abandoned immediately, teardown is forced.
//!   This is the only path that returns with producers still open.
//! - Teardown runs exactly once (when a UI is active) and its error is recorded too.
//!
//! The loop never retries anything and never stops the worker itself; plumb the same
//! [`CancellationToken`] into the worker if it must stop promptly.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, trace};

use super::worker::WorkerResult;
use crate::error::{LoopFailure, RunError};
use crate::events::{Subscription, Unsubscriber};
use crate::ui::UiCollection;

/// Single coordinating routine for one application run.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use appvisor::{Bus, Event, EventLoop, LogUi, Ui, UiCollection, spawn_worker};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bus = Bus::new();
/// let subscription = bus.subscribe();
///
/// let publisher = bus.clone();
/// let worker = spawn_worker(async move {
///     publisher.publish(Event::new("working"));
///     publisher.publish(Event::exit(false));
///     Ok(())
/// });
///
/// let uis: Vec<Arc<dyn Ui>> = vec![Arc::new(LogUi::new())];
/// let result = EventLoop::new(CancellationToken::new())
///     .with_subscription(subscription)
///     .with_uis(UiCollection::new(uis))
///     .run(worker)
///     .await;
/// assert!(result.is_ok());
/// # }
/// ```
pub struct EventLoop {
    token: CancellationToken,
    span: Span,
    subscription: Option<Subscription>,
    uis: UiCollection,
}

impl EventLoop {
    /// Creates a headless, bus-less loop bound to `token`.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            span: Span::none(),
            subscription: None,
            uis: UiCollection::default(),
        }
    }

    /// Sets the subscription to consume (owned by this run).
    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscription = Some(subscription);
        self
    }

    /// Sets the subscription, if any.
    pub fn with_optional_subscription(mut self, subscription: Option<Subscription>) -> Self {
        self.subscription = subscription;
        self
    }

    /// Sets the UI candidates.
    pub fn with_uis(mut self, uis: UiCollection) -> Self {
        self.uis = uis;
        self
    }

    /// Sets the span diagnostics are recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Runs until both sources are exhausted or the token is cancelled.
    ///
    /// Returns every failure observed during the run as one [`RunError`].
    pub async fn run(self, worker: mpsc::Receiver<WorkerResult>) -> Result<(), RunError> {
        let span = self.span.clone();
        self.run_inner(worker).instrument(span).await
    }

    async fn run_inner(self, worker: mpsc::Receiver<WorkerResult>) -> Result<(), RunError> {
        let EventLoop {
            token,
            subscription,
            uis,
            ..
        } = self;

        let (mut events, unsubscriber) = match subscription {
            Some(sub) => {
                let (rx, unsub) = sub.into_parts();
                (Some(rx), unsub)
            }
            None => (None, Unsubscriber::detached()),
        };
        let mut worker = Some(worker);

        uis.setup(unsubscriber.clone()).await;

        let mut failures = Vec::new();
        let mut force_teardown = false;

        while worker.is_some() || events.is_some() {
            tokio::select! {
                res = async {
                    match worker.as_mut() {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => match res {
                    None => {
                        trace!("worker stopped");
                        worker = None;
                    }
                    Some(Ok(())) => {}
                    Some(Err(err)) => {
                        debug!(error = %err, "worker failed; unsubscribing");
                        failures.push(LoopFailure::Worker(err));
                        unsubscriber.unsubscribe();
                        // events still in flight are abandoned with the run
                        force_teardown = true;
                    }
                },
                ev = async {
                    match events.as_mut() {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => match ev {
                    None => {
                        trace!("bus stopped");
                        events = None;
                    }
                    Some(ev) => {
                        let exit = ev.exit_request();
                        match uis.handle(&ev).await {
                            Ok(()) => {}
                            Err(err) if err.is_unsubscribe() => {
                                trace!("ui unsubscribed");
                                unsubscriber.unsubscribe();
                                events = None;
                            }
                            Err(err) => failures.push(LoopFailure::Handle(err)),
                        }
                        if let Some(exit) = exit {
                            debug!(interrupt = exit.interrupt, "exit requested");
                            unsubscriber.unsubscribe();
                            if exit.interrupt {
                                // queued events are not drained
                                events = None;
                                force_teardown = true;
                            }
                        }
                    }
                },
                _ = token.cancelled() => {
                    trace!("signal interrupt");
                    worker = None;
                    events = None;
                    force_teardown = true;
                }
            }
        }

        if let Err(err) = uis.teardown(force_teardown).await {
            failures.push(LoopFailure::Teardown(err));
        }
        unsubscriber.unsubscribe();

        match RunError::from_failures(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, OnceLock};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::timeout;

    use super::*;
    use crate::error::UiError;
    use crate::events::{Bus, Event};
    use crate::ui::Ui;
    use crate::testsupport::{Call, MockUi, TEST_TIMEOUT, dyn_ui};

    fn looped(sub: Subscription, uis: &[&Arc<MockUi>]) -> EventLoop {
        EventLoop::new(CancellationToken::new())
            .with_subscription(sub)
            .with_uis(UiCollection::new(uis.iter().map(|u| dyn_ui(u)).collect()))
    }

    /// Worker that sends a heartbeat, closes its channel, then publishes `last`.
    fn closing_worker(bus: &Bus, last: Option<Event>) -> mpsc::Receiver<WorkerResult> {
        let (tx, rx) = mpsc::channel(1);
        let bus = bus.clone();
        tokio::spawn(async move {
            let _ = tx.send(Ok(())).await;
            drop(tx);
            if let Some(ev) = last {
                bus.publish(ev);
            }
        });
        rx
    }

    #[tokio::test]
    async fn graceful_exit_when_ui_unsubscribes() {
        let bus = Bus::new();
        let final_event = Event::new("testing-exit");
        let ui = MockUi::new("ui").unsubscribe_on(final_event.clone()).arc();

        let worker = closing_worker(&bus, Some(final_event.clone()));
        let res = timeout(TEST_TIMEOUT, looped(bus.subscribe(), &[&ui]).run(worker))
            .await
            .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(
            ui.calls(),
            vec![Call::Setup, Call::Handle(final_event), Call::Teardown(false)]
        );
    }

    #[tokio::test]
    async fn worker_error_forces_teardown() {
        let bus = Bus::new();
        let ui = MockUi::new("ui").arc();

        let (tx, rx) = mpsc::channel::<WorkerResult>(1);
        tokio::spawn(async move {
            let _ = tx.send(Ok(())).await;
            let _ = tx.send(Err("worker error".into())).await;
        });

        let err = timeout(TEST_TIMEOUT, looped(bus.subscribe(), &[&ui]).run(rx))
            .await
            .expect("event loop hung")
            .unwrap_err();

        assert_eq!(err.len(), 1);
        let worker_errs: Vec<String> = err.worker_errors().map(|e| e.to_string()).collect();
        assert_eq!(worker_errs, vec!["worker error".to_string()]);
        assert_eq!(ui.teardowns(), vec![true]);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_sentinel_is_not_an_error() {
        let bus = Bus::new();
        let final_event = Event::new("testing-exit");
        let ui = MockUi::new("ui")
            .on_handle(|_| Err(UiError::Unsubscribe))
            .arc();

        let worker = closing_worker(&bus, Some(final_event.clone()));
        let res = timeout(TEST_TIMEOUT, looped(bus.subscribe(), &[&ui]).run(worker))
            .await
            .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(ui.handled(), vec![final_event]);
        assert_eq!(ui.teardowns(), vec![false]);
    }

    #[tokio::test]
    async fn handle_error_propagates_without_forcing() {
        let bus = Bus::new();
        let final_event = Event::new("testing-exit")
            .with_error(std::io::Error::other("an exit error occurred"));
        let ui = MockUi::new("ui")
            .unsubscribe_on(final_event.clone())
            .on_handle(|ev| {
                let msg = ev.error.as_ref().map(|e| e.to_string()).unwrap_or_default();
                Err(UiError::failed(msg))
            })
            .arc();

        let worker = closing_worker(&bus, Some(final_event));
        let err = timeout(TEST_TIMEOUT, looped(bus.subscribe(), &[&ui]).run(worker))
            .await
            .expect("event loop hung")
            .unwrap_err();

        assert_eq!(err.len(), 1);
        assert!(matches!(
            &err.failures()[0],
            LoopFailure::Handle(UiError::Failed { error }) if error == "an exit error occurred"
        ));
        assert_eq!(ui.teardowns(), vec![false]);
    }

    #[tokio::test]
    async fn cancellation_stops_a_run_that_never_ends() {
        let bus = Bus::new();
        let ui = MockUi::new("ui").arc();
        let token = CancellationToken::new();

        // worker never reports, bus never closes
        let (_tx, rx) = mpsc::channel::<WorkerResult>(1);

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let res = timeout(
            TEST_TIMEOUT,
            EventLoop::new(token)
                .with_subscription(bus.subscribe())
                .with_uis(UiCollection::new(vec![dyn_ui(&ui)]))
                .run(rx),
        )
        .await
        .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(ui.teardowns(), vec![true]);
    }

    #[tokio::test]
    async fn exit_event_stops_gracefully() {
        let bus = Bus::new();
        let final_event = Event::exit(false);
        let ui = MockUi::new("ui").arc();

        let worker = closing_worker(&bus, Some(final_event.clone()));
        let res = timeout(TEST_TIMEOUT, looped(bus.subscribe(), &[&ui]).run(worker))
            .await
            .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(ui.handled(), vec![final_event]);
        assert_eq!(ui.teardowns(), vec![false]);
    }

    #[tokio::test]
    async fn interrupt_event_forces_teardown() {
        let bus = Bus::new();
        let final_event = Event::exit(true);
        let ui = MockUi::new("ui").arc();

        let worker = closing_worker(&bus, Some(final_event.clone()));
        let res = timeout(TEST_TIMEOUT, looped(bus.subscribe(), &[&ui]).run(worker))
            .await
            .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(ui.handled(), vec![final_event]);
        assert_eq!(ui.teardowns(), vec![true]);
    }

    #[tokio::test]
    async fn interrupt_event_skips_queued_events() {
        let bus = Bus::new();
        let subscription = bus.subscribe();
        let ui = MockUi::new("ui").arc();

        bus.publish(Event::exit(true));
        bus.publish(Event::new("after-interrupt"));
        let (tx, rx) = mpsc::channel::<WorkerResult>(1);
        drop(tx);

        let res = timeout(TEST_TIMEOUT, looped(subscription, &[&ui]).run(rx))
            .await
            .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(ui.handled(), vec![Event::exit(true)]);
        assert_eq!(ui.teardowns(), vec![true]);
    }

    #[tokio::test]
    async fn graceful_exit_drains_queued_events() {
        let bus = Bus::new();
        let subscription = bus.subscribe();
        let ui = MockUi::new("ui").arc();

        bus.publish(Event::exit(false));
        bus.publish(Event::new("after-exit"));
        let (tx, rx) = mpsc::channel::<WorkerResult>(1);
        drop(tx);

        let res = timeout(TEST_TIMEOUT, looped(subscription, &[&ui]).run(rx))
            .await
            .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(
            ui.handled(),
            vec![Event::exit(false), Event::new("after-exit")]
        );
        assert_eq!(ui.teardowns(), vec![false]);
    }

    #[tokio::test]
    async fn wrapped_unsubscribe_sentinel_ends_the_run() {
        let bus = Bus::new();
        let final_event = Event::new("testing-exit");
        let ui = MockUi::new("ui")
            .on_handle(|_| Err(UiError::Other(Box::new(UiError::Unsubscribe))))
            .arc();

        let worker = closing_worker(&bus, Some(final_event.clone()));
        let res = timeout(TEST_TIMEOUT, looped(bus.subscribe(), &[&ui]).run(worker))
            .await
            .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(ui.handled(), vec![final_event]);
        assert_eq!(ui.teardowns(), vec![false]);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn teardown_error_is_reported() {
        let bus = Bus::new();
        let final_event = Event::new("testing-exit");
        let ui = MockUi::new("ui")
            .unsubscribe_on(final_event.clone())
            .failing_teardown("sorry, dave, the UI doesn't want to be torn down")
            .arc();

        let worker = closing_worker(&bus, Some(final_event));
        let err = timeout(TEST_TIMEOUT, looped(bus.subscribe(), &[&ui]).run(worker))
            .await
            .expect("event loop hung")
            .unwrap_err();

        assert!(matches!(&err.failures()[..], [LoopFailure::Teardown(_)]));
        assert!(err.to_string().contains("doesn't want to be torn down"));
        assert_eq!(ui.teardowns(), vec![false]);
    }

    #[tokio::test]
    async fn handle_and_teardown_errors_are_both_kept() {
        let bus = Bus::new();
        let final_event = Event::new("testing-exit");
        let ui = MockUi::new("ui")
            .unsubscribe_on(final_event.clone())
            .on_handle(|_| Err(UiError::failed("render failed")))
            .failing_teardown("teardown failed")
            .arc();

        let worker = closing_worker(&bus, Some(final_event));
        let err = timeout(TEST_TIMEOUT, looped(bus.subscribe(), &[&ui]).run(worker))
            .await
            .expect("event loop hung")
            .unwrap_err();

        let labels: Vec<_> = err.failures().iter().map(LoopFailure::as_label).collect();
        assert_eq!(labels, vec!["ui_handle_failed", "ui_teardown_failed"]);
        let messages: Vec<_> = err.ui_errors().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec!["ui failed: render failed", "ui failed: teardown failed"]
        );
    }

    #[tokio::test]
    async fn headless_run_drops_events_and_stops_on_exit() {
        let bus = Bus::new();
        let worker = closing_worker(&bus, None);

        let publisher = bus.clone();
        let subscription = bus.subscribe();
        tokio::spawn(async move {
            publisher.publish(Event::new("ignored"));
            publisher.publish(Event::exit(false));
        });

        let res = timeout(
            TEST_TIMEOUT,
            EventLoop::new(CancellationToken::new())
                .with_subscription(subscription)
                .run(worker),
        )
        .await
        .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
    }

    #[tokio::test]
    async fn no_bus_stops_when_worker_closes() {
        let ui = MockUi::new("ui").arc();
        let (tx, rx) = mpsc::channel::<WorkerResult>(1);
        drop(tx);

        let res = timeout(
            TEST_TIMEOUT,
            EventLoop::new(CancellationToken::new())
                .with_uis(UiCollection::new(vec![dyn_ui(&ui)]))
                .run(rx),
        )
        .await
        .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(ui.calls(), vec![Call::Setup, Call::Teardown(false)]);
    }

    #[tokio::test]
    async fn events_are_handled_in_arrival_order() {
        let bus = Bus::new();
        let ui = MockUi::new("ui").arc();
        let subscription = bus.subscribe();

        let expected: Vec<Event> = (0..20_i64).map(|n| Event::new("n").with_value(n)).collect();
        for ev in &expected {
            bus.publish(ev.clone());
        }
        bus.publish(Event::exit(false));

        let (tx, rx) = mpsc::channel::<WorkerResult>(1);
        drop(tx);

        let res = timeout(TEST_TIMEOUT, looped(subscription, &[&ui]).run(rx))
            .await
            .expect("event loop hung");
        assert!(res.is_ok(), "{res:?}");

        let mut handled = ui.handled();
        assert_eq!(handled.pop(), Some(Event::exit(false)));
        assert_eq!(handled, expected);
    }

    /// Replaces itself with `next` while handling its first event.
    struct SelfReplacing {
        uis: OnceLock<UiCollection>,
        next: Arc<dyn Ui>,
        torn_down: AtomicBool,
    }

    #[async_trait]
    impl Ui for SelfReplacing {
        async fn setup(&self, _unsubscribe: Unsubscriber) -> Result<(), UiError> {
            Ok(())
        }

        async fn handle(&self, _event: &Event) -> Result<(), UiError> {
            if let Some(uis) = self.uis.get() {
                uis.replace(self.next.clone()).await?;
            }
            Ok(())
        }

        async fn teardown(&self, _force: bool) -> Result<(), UiError> {
            self.torn_down.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn ui_can_replace_itself_while_handling() {
        let bus = Bus::new();
        let subscription = bus.subscribe();
        let next = MockUi::new("next").arc();
        let first = Arc::new(SelfReplacing {
            uis: OnceLock::new(),
            next: dyn_ui(&next),
            torn_down: AtomicBool::new(false),
        });
        let uis = UiCollection::new(vec![first.clone() as Arc<dyn Ui>]);
        let _ = first.uis.set(uis.clone());

        bus.publish(Event::new("first"));
        bus.publish(Event::new("second"));
        bus.publish(Event::exit(false));
        let (tx, rx) = mpsc::channel::<WorkerResult>(1);
        drop(tx);

        let res = timeout(
            TEST_TIMEOUT,
            EventLoop::new(CancellationToken::new())
                .with_subscription(subscription)
                .with_uis(uis)
                .run(rx),
        )
        .await
        .expect("event loop deadlocked");

        assert!(res.is_ok(), "{res:?}");
        assert!(first.torn_down.load(Ordering::SeqCst));
        assert_eq!(
            next.calls(),
            vec![
                Call::Setup,
                Call::Handle(Event::new("second")),
                Call::Handle(Event::exit(false)),
                Call::Teardown(false),
            ]
        );
    }

    #[tokio::test]
    async fn ui_fallback_during_run() {
        let bus = Bus::new();
        let broken = MockUi::new("broken").failing_setup("no terminal").arc();
        let plain = MockUi::new("plain").arc();
        let unused = MockUi::new("unused").arc();

        let worker = closing_worker(&bus, Some(Event::exit(false)));
        let res = timeout(
            TEST_TIMEOUT,
            looped(bus.subscribe(), &[&broken, &plain, &unused]).run(worker),
        )
        .await
        .expect("event loop hung");

        assert!(res.is_ok(), "{res:?}");
        assert_eq!(broken.calls(), vec![Call::Setup]);
        assert_eq!(plain.teardowns(), vec![false]);
        assert!(unused.calls().is_empty());
    }
}
