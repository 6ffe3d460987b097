//! Error types used by the appvisor runtime, UIs and bootstrapping.
//!
//! This module defines:
//!
//! - [`UiError`]: errors returned by a [`Ui`](crate::Ui) implementation, including the
//!   [`UiError::Unsubscribe`] control-flow sentinel.
//! - [`ReplaceError`]: failures while hot-swapping the active UI.
//! - [`LoopFailure`] / [`RunError`]: the individual failures of one event loop run and
//!   the aggregate that preserves all of them.
//! - [`SetupError`]: errors raised while building application state.
//!
//! All enums provide `as_label` for logs/metrics.

use std::fmt;

use thiserror::Error;

/// Boxed, thread-safe error used at the worker and UI seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by a UI.
///
/// [`UiError::Unsubscribe`] is not a failure: returned from [`Ui::handle`](crate::Ui::handle)
/// it asks the event loop to stop receiving events.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UiError {
    /// The UI no longer wants events; the loop treats the event source as exhausted.
    #[error("unsubscribed from event bus")]
    Unsubscribe,

    /// The UI could not attach (e.g. no terminal available).
    #[error("ui unavailable: {reason}")]
    Unavailable {
        /// Why the UI cannot be used.
        reason: String,
    },

    /// Rendering or teardown failed.
    #[error("ui failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Hot-swapping the active UI failed (surfaced from inside a UI).
    #[error(transparent)]
    Replace(#[from] ReplaceError),

    /// Any other error raised by the UI.
    #[error(transparent)]
    Other(BoxError),
}

impl UiError {
    /// Convenience constructor for [`UiError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        UiError::Failed {
            error: error.into(),
        }
    }

    /// Convenience constructor for [`UiError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        UiError::Unavailable {
            reason: reason.into(),
        }
    }

    /// True for the unsubscribe sentinel, including one wrapped in
    /// [`UiError::Replace`] or anywhere in the source chain of [`UiError::Other`].
    pub fn is_unsubscribe(&self) -> bool {
        match self {
            UiError::Unsubscribe => true,
            UiError::Replace(e) => e.cause().is_unsubscribe(),
            UiError::Other(e) => {
                let first: &(dyn std::error::Error + 'static) = &**e;
                let mut next = Some(first);
                while let Some(err) = next {
                    if let Some(ui) = err.downcast_ref::<UiError>() {
                        return ui.is_unsubscribe();
                    }
                    next = err.source();
                }
                false
            }
            _ => false,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use appvisor::UiError;
    ///
    /// assert_eq!(UiError::Unsubscribe.as_label(), "ui_unsubscribe");
    /// assert_eq!(UiError::failed("boom").as_label(), "ui_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            UiError::Unsubscribe => "ui_unsubscribe",
            UiError::Unavailable { .. } => "ui_unavailable",
            UiError::Failed { .. } => "ui_failed",
            UiError::Replace(_) => "ui_replace",
            UiError::Other(_) => "ui_other",
        }
    }
}

/// # Errors produced by [`UiCollection::replace`](crate::UiCollection::replace).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ReplaceError {
    /// The currently active UI refused to tear down; the replacement was never attempted.
    #[error("unable to teardown existing UI: {0}")]
    Teardown(#[source] Box<UiError>),

    /// The replacement UI failed to set up; no UI is active afterwards.
    #[error("unable to setup UI replacement: {0}")]
    Setup(#[source] Box<UiError>),
}

impl ReplaceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ReplaceError::Teardown(_) => "replace_teardown",
            ReplaceError::Setup(_) => "replace_setup",
        }
    }

    /// The UI error that caused the replacement to fail.
    pub fn cause(&self) -> &UiError {
        match self {
            ReplaceError::Teardown(e) | ReplaceError::Setup(e) => e,
        }
    }
}

/// # One failure observed during an event loop run.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LoopFailure {
    /// The background worker reported an error.
    #[error("{0}")]
    Worker(BoxError),

    /// The active UI failed to handle an event.
    #[error("{0}")]
    Handle(UiError),

    /// The active UI failed to tear down.
    #[error("{0}")]
    Teardown(UiError),
}

impl LoopFailure {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoopFailure::Worker(_) => "worker_failed",
            LoopFailure::Handle(_) => "ui_handle_failed",
            LoopFailure::Teardown(_) => "ui_teardown_failed",
        }
    }
}

/// # Aggregate error of one event loop run.
///
/// Every failure is kept in arrival order; none masks another.
///
/// ```text
/// 2 errors occurred:
///     * worker exploded
///     * ui failed: terminal gone
/// ```
#[derive(Debug)]
pub struct RunError {
    failures: Vec<LoopFailure>,
}

impl RunError {
    /// Builds an aggregate from the collected failures; `None` when there are none.
    pub fn from_failures(failures: Vec<LoopFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    /// All failures, in the order they were observed.
    pub fn failures(&self) -> &[LoopFailure] {
        &self.failures
    }

    /// Consumes the aggregate and returns its failures.
    pub fn into_failures(self) -> Vec<LoopFailure> {
        self.failures
    }

    /// Worker errors only.
    pub fn worker_errors(&self) -> impl Iterator<Item = &BoxError> {
        self.failures.iter().filter_map(|f| match f {
            LoopFailure::Worker(e) => Some(e),
            _ => None,
        })
    }

    /// UI errors (handle and teardown).
    pub fn ui_errors(&self) -> impl Iterator<Item = &UiError> {
        self.failures.iter().filter_map(|f| match f {
            LoopFailure::Handle(e) | LoopFailure::Teardown(e) => Some(e),
            LoopFailure::Worker(_) => None,
        })
    }

    /// Number of failures (always at least one).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.failures.len()
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.failures.as_slice() {
            return write!(f, "1 error occurred:\n\t* {only}");
        }
        write!(f, "{} errors occurred:", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "\n\t* {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}

/// # Errors produced while bootstrapping an application.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SetupError {
    /// The configured log level string is not recognized.
    #[error("unable to select logging level: invalid level {level:?}")]
    InvalidLevel {
        /// The rejected level string.
        level: String,
    },

    /// The logger constructor failed.
    #[error("unable to setup logger: {0}")]
    Logger(#[source] BoxError),

    /// The UI constructor failed.
    #[error("unable to setup UI: {0}")]
    Ui(#[source] BoxError),

    /// A user initializer failed.
    #[error("initializer failed: {0}")]
    Initializer(#[source] BoxError),

    /// I/O while preparing resources (e.g. the log file).
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl SetupError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SetupError::InvalidLevel { .. } => "setup_invalid_level",
            SetupError::Logger(_) => "setup_logger",
            SetupError::Ui(_) => "setup_ui",
            SetupError::Initializer(_) => "setup_initializer",
            SetupError::Io(_) => "setup_io",
        }
    }
}
