//! # Application: bootstrapped resources plus the event loop.
//!
//! ```text
//! SetupConfig ──► Application::new ──► State { bus, subscription, logger, uis }
//!                                           │
//! worker ──────────────► Application::run ──┴─► EventLoop (under `logger`)
//! ```
//!
//! The application's logger is installed as the default dispatcher only while
//! [`Application::run`] is being polled; it never becomes the global default.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, info_span};

use super::shutdown::cancel_on_shutdown_signal;
use super::{EventLoop, State, WorkerResult};
use crate::config::{Config, SetupConfig};
use crate::error::{RunError, SetupError};
use crate::events::Bus;
use crate::ui::UiCollection;

/// A bootstrapped application ready to run.
///
/// ## Example
/// ```rust
/// use appvisor::{Application, Event, Identification, SetupConfig, spawn_worker};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let app = Application::new(SetupConfig::new(Identification::new("demo", "0.1.0")))?;
///
/// let bus = app.bus().cloned().expect("default setup has a bus");
/// let worker = spawn_worker(async move {
///     bus.publish(Event::new("step").with_value("done"));
///     bus.publish(Event::exit(false));
///     Ok(())
/// });
///
/// app.run(CancellationToken::new(), worker).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Application {
    state: State,
    uis: UiCollection,
}

impl Application {
    /// Builds the application from its recipe and the recipe's default config.
    pub fn new(setup: SetupConfig) -> Result<Self, SetupError> {
        let config = setup.default_config();
        Self::with_config(setup, config)
    }

    /// Builds the application from its recipe and an explicit `config`.
    ///
    /// Level selection runs on `config` before any resource is constructed.
    pub fn with_config(setup: SetupConfig, mut config: Config) -> Result<Self, SetupError> {
        config.post_load()?;
        let state = State::build(&setup, config)?;
        let uis = UiCollection::new(state.uis.clone());
        Ok(Self { state, uis })
    }

    /// The resolved configuration.
    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// Built resources.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// The event bus, if the application has one.
    pub fn bus(&self) -> Option<&Bus> {
        self.state.bus.as_ref()
    }

    /// Handle to the UI collection the event loop will drive.
    ///
    /// Hand a clone to a UI that needs to call [`UiCollection::replace`].
    pub fn uis(&self) -> UiCollection {
        self.uis.clone()
    }

    /// Runs the event loop until the worker and bus are done or `token` is cancelled.
    pub async fn run(
        self,
        token: CancellationToken,
        worker: mpsc::Receiver<WorkerResult>,
    ) -> Result<(), RunError> {
        let Application { state, uis } = self;
        let State {
            config,
            bus,
            subscription,
            logger,
            ..
        } = state;

        async move {
            // the bus outlives the loop even if no publisher kept a clone
            let _bus = bus;
            info!("{}", config.id.version_line());
            debug!(config = ?config, "config");

            let span = info_span!("eventloop", component = "eventloop");
            EventLoop::new(token)
                .with_optional_subscription(subscription)
                .with_uis(uis)
                .with_span(span)
                .run(worker)
                .await
        }
        .with_subscriber(logger)
        .await
    }

    /// Like [`Application::run`], cancelled by SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere).
    pub async fn run_until_signal(
        self,
        worker: mpsc::Receiver<WorkerResult>,
    ) -> Result<(), RunError> {
        let token = CancellationToken::new();
        let listener = cancel_on_shutdown_signal(token.clone());
        let res = self.run(token.clone(), worker).await;
        token.cancel();
        let _ = listener.await;
        res
    }
}
