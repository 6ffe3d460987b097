//! # SetupConfig: constructor injection for application resources.
//!
//! Every resource the application owns is produced by a replaceable constructor:
//!
//! ```text
//! SetupConfig
//!   ├─ bus        Fn(&Config) -> Option<Bus>                      (default: new bus)
//!   ├─ logger     Fn(&Config) -> Result<Dispatch, BoxError>       (default: default_logger)
//!   ├─ uis        Fn(&Config) -> Result<Vec<Arc<dyn Ui>>, BoxError>  (default: none → headless)
//!   └─ initializers [Fn(&Config, &mut State) -> Result<(), BoxError>]  (run in order)
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::Dispatch;

use super::{Config, Identification, LoggingConfig, default_logger};
use crate::core::State;
use crate::error::BoxError;
use crate::events::Bus;
use crate::ui::Ui;

/// Produces the event bus; `None` runs without one.
pub type BusConstructor = Arc<dyn Fn(&Config) -> Option<Bus> + Send + Sync>;

/// Produces the application logger.
pub type LoggerConstructor = Arc<dyn Fn(&Config) -> Result<Dispatch, BoxError> + Send + Sync>;

/// Produces the UI candidates in priority order.
pub type UiConstructor = Arc<dyn Fn(&Config) -> Result<Vec<Arc<dyn Ui>>, BoxError> + Send + Sync>;

/// User hook run after bus, logger and UIs exist.
///
/// An initializer may replace or remove `State::bus`; the event loop's
/// subscription is then re-taken from the bus left in place.
pub type Initializer = Arc<dyn Fn(&Config, &mut State) -> Result<(), BoxError> + Send + Sync>;

/// Recipe for building an application.
///
/// ## Defaults
/// - `default_logging = Some(level "warn")`
/// - bus: a fresh [`Bus`]
/// - logger: [`default_logger`]
/// - UIs: none (headless)
/// - no initializers
#[derive(Clone)]
pub struct SetupConfig {
    /// Application identity.
    pub id: Identification,
    /// Logging options used when the caller supplies no [`Config`].
    pub default_logging: Option<LoggingConfig>,
    /// Bus constructor.
    pub bus: BusConstructor,
    /// Logger constructor.
    pub logger: LoggerConstructor,
    /// UI constructor.
    pub uis: UiConstructor,
    /// Initializers, run in insertion order.
    pub initializers: Vec<Initializer>,
}

impl SetupConfig {
    /// Default recipe for `id`.
    pub fn new(id: Identification) -> Self {
        Self {
            id,
            default_logging: Some(LoggingConfig::with_level("warn")),
            bus: Arc::new(|_: &Config| Some(Bus::new())),
            logger: Arc::new(|cfg: &Config| default_logger(cfg).map_err(Into::into)),
            uis: Arc::new(|_: &Config| Ok(Vec::new())),
            initializers: Vec::new(),
        }
    }

    /// Sets the UI constructor.
    pub fn with_ui<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&Config) -> Result<Vec<Arc<dyn Ui>>, BoxError> + Send + Sync + 'static,
    {
        self.uis = Arc::new(constructor);
        self
    }

    /// Sets the bus constructor.
    pub fn with_bus_constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&Config) -> Option<Bus> + Send + Sync + 'static,
    {
        self.bus = Arc::new(constructor);
        self
    }

    /// Runs without a bus: the event loop only watches the worker and cancellation.
    pub fn with_no_bus(self) -> Self {
        self.with_bus_constructor(|_| None)
    }

    /// Sets the logger constructor.
    pub fn with_logger<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&Config) -> Result<Dispatch, BoxError> + Send + Sync + 'static,
    {
        self.logger = Arc::new(constructor);
        self
    }

    /// Sets the default logging options.
    pub fn with_logging_config(mut self, cfg: LoggingConfig) -> Self {
        self.default_logging = Some(cfg);
        self
    }

    /// Drops logging entirely: no logging options and a no-op logger.
    pub fn with_no_logging(mut self) -> Self {
        self.default_logging = None;
        self.with_logger(|_| Ok(Dispatch::none()))
    }

    /// Appends an initializer.
    pub fn with_initializer<F>(mut self, init: F) -> Self
    where
        F: Fn(&Config, &mut State) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.initializers.push(Arc::new(init));
        self
    }

    /// The [`Config`] implied by this recipe (identity plus default logging).
    pub fn default_config(&self) -> Config {
        Config {
            id: self.id.clone(),
            log: self.default_logging.clone(),
        }
    }
}

impl fmt::Debug for SetupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupConfig")
            .field("id", &self.id)
            .field("default_logging", &self.default_logging)
            .field("initializers", &self.initializers.len())
            .finish_non_exhaustive()
    }
}
