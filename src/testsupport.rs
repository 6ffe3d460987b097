//! Shared test fixtures for the UI, event loop and application test modules.
//!
//! [`MockUi`] records every lifecycle call and lets a test script setup,
//! handle and teardown outcomes without a bespoke type per test.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::UiError;
use crate::events::{Event, Unsubscriber};
use crate::ui::Ui;

/// Upper bound for any test that could hang if the loop misbehaves.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// One recorded lifecycle call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Setup,
    Handle(Event),
    Teardown(bool),
}

type HandleFn = Box<dyn Fn(&Event) -> Result<(), UiError> + Send + Sync>;

/// Scriptable, recording UI.
pub struct MockUi {
    name: String,
    setup_error: Option<String>,
    teardown_error: Option<String>,
    on_handle: Option<HandleFn>,
    unsubscribe_on: Option<Event>,
    unsubscriber: Mutex<Option<Unsubscriber>>,
    calls: Mutex<Vec<Call>>,
}

impl MockUi {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            setup_error: None,
            teardown_error: None,
            on_handle: None,
            unsubscribe_on: None,
            unsubscriber: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// `setup` fails with the given message.
    pub fn failing_setup(mut self, msg: &str) -> Self {
        self.setup_error = Some(msg.to_string());
        self
    }

    /// `teardown` fails with the given message.
    pub fn failing_teardown(mut self, msg: &str) -> Self {
        self.teardown_error = Some(msg.to_string());
        self
    }

    /// Decides the result of every `handle` call.
    pub fn on_handle<F>(mut self, f: F) -> Self
    where
        F: Fn(&Event) -> Result<(), UiError> + Send + Sync + 'static,
    {
        self.on_handle = Some(Box::new(f));
        self
    }

    /// Calls the unsubscriber it was given at setup when handling `event`.
    pub fn unsubscribe_on(mut self, event: Event) -> Self {
        self.unsubscribe_on = Some(event);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn setup_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Setup))
            .count()
    }

    pub fn handled(&self) -> Vec<Event> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Handle(ev) => Some(ev),
                _ => None,
            })
            .collect()
    }

    pub fn teardowns(&self) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Teardown(force) => Some(force),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Ui for MockUi {
    async fn setup(&self, unsubscribe: Unsubscriber) -> Result<(), UiError> {
        self.record(Call::Setup);
        *self.unsubscriber.lock().unwrap() = Some(unsubscribe);
        match &self.setup_error {
            Some(msg) => Err(UiError::failed(msg.clone())),
            None => Ok(()),
        }
    }

    async fn handle(&self, event: &Event) -> Result<(), UiError> {
        self.record(Call::Handle(event.clone()));
        if self.unsubscribe_on.as_ref() == Some(event) {
            if let Some(u) = self.unsubscriber.lock().unwrap().as_ref() {
                u.unsubscribe();
            }
        }
        match &self.on_handle {
            Some(f) => f(event),
            None => Ok(()),
        }
    }

    async fn teardown(&self, force: bool) -> Result<(), UiError> {
        self.record(Call::Teardown(force));
        match &self.teardown_error {
            Some(msg) => Err(UiError::failed(msg.clone())),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Upcasts a mock for APIs taking `Arc<dyn Ui>`.
pub fn dyn_ui(ui: &Arc<MockUi>) -> Arc<dyn Ui> {
    ui.clone()
}
