//! # Application configuration.
//!
//! - [`Identification`]: who the application is (name, version, build metadata).
//! - [`Config`]: the runtime configuration, read-only once the application is built.
//! - [`LoggingConfig`]: logging knobs and level selection.
//! - [`SetupConfig`]: how to build the application's resources (bus, logger, UIs,
//!   initializers).

mod logging;
mod setup;

use tracing::level_filters::LevelFilter;

use crate::error::SetupError;

pub use logging::{LoggingConfig, TerminalProbe, default_logger, parse_level};
pub use setup::{BusConstructor, Initializer, LoggerConstructor, SetupConfig, UiConstructor};

/// Application identity, generally filled in from build information.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identification {
    /// Application name.
    pub name: String,
    /// Semantic version (`""` = unknown).
    pub version: String,
    /// Git SHA at build time.
    pub git_commit: String,
    /// Tree state at build time ("clean" or "dirty").
    pub git_description: String,
    /// Build date.
    pub build_date: String,
}

impl Identification {
    /// Identification with a name and version only.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// The startup line: `"<name> version: <version>"`, or just the name.
    pub fn version_line(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{} version: {}", self.name, self.version)
        }
    }
}

/// Runtime configuration.
///
/// `log = None` means logging is not configured: the default logger discards
/// everything and the effective level is `warn`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Application identity.
    pub id: Identification,
    /// Logging options.
    pub log: Option<LoggingConfig>,
}

impl Config {
    /// Configuration for `id` without logging.
    pub fn new(id: Identification) -> Self {
        Self { id, log: None }
    }

    /// Sets the logging options.
    pub fn with_logging(mut self, log: LoggingConfig) -> Self {
        self.log = Some(log);
        self
    }

    /// Runs level selection on the logging options, if any.
    pub fn post_load(&mut self) -> Result<(), SetupError> {
        match self.log.as_mut() {
            Some(log) => log.post_load(),
            None => Ok(()),
        }
    }

    /// The effective log level; `warn` when logging is not configured.
    pub fn log_level(&self) -> Result<LevelFilter, SetupError> {
        match &self.log {
            Some(log) => log.level_filter(),
            None => Ok(LevelFilter::WARN),
        }
    }
}
