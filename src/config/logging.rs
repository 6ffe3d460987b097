//! # Logging configuration and the default logger.
//!
//! [`LoggingConfig`] carries the user-facing knobs (`-q`, `-v`, level hint, log
//! file). [`LoggingConfig::post_load`] resolves them into one effective level; the
//! [`default_logger`] constructor turns the result into a [`Dispatch`].
//!
//! ## Level selection
//! ```text
//! no logging config        → warn
//! quiet                    → disabled (wins over everything)
//! verbosity v > 0          → [warn, info, debug, trace][min(v, 3)]
//! level hint "..."         → parsed; info or more verbose also sets verbosity = 1
//! empty level hint         → info
//! ```
//!
//! ## Sinks
//! - stderr only when `verbosity > 0 && !quiet`;
//! - the log file (appended) whenever one is configured;
//! - neither → no-op dispatcher.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

use super::Config;
use crate::error::SetupError;

/// Verbosity-indexed levels: `-v` → info, `-vv` → debug, `-vvv` → trace.
const VERBOSITY_LEVELS: [LevelFilter; 4] = [
    LevelFilter::WARN,
    LevelFilter::INFO,
    LevelFilter::DEBUG,
    LevelFilter::TRACE,
];

/// User-facing logging options.
///
/// ## Field semantics
/// - `quiet`: suppress all logging output
/// - `verbosity`: count of `-v` flags (`0` = not verbose)
/// - `level`: level hint (`""` = unset); rewritten to the effective level by `post_load`
/// - `file`: path logs are appended to (`None` = no file)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Suppress all logging output.
    pub quiet: bool,
    /// Count of `-v` flags.
    pub verbosity: u8,
    /// Level hint, e.g. `"debug"`.
    pub level: String,
    /// Log file location.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Config with an explicit level hint.
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// Resolves the effective level and stores it back into `level`.
    pub fn post_load(&mut self) -> Result<(), SetupError> {
        let level = self.select_level()?;
        self.level = level_name(level).to_string();
        Ok(())
    }

    /// Computes the effective level; may raise `verbosity` to 1 for verbose hints.
    pub fn select_level(&mut self) -> Result<LevelFilter, SetupError> {
        if self.quiet {
            return Ok(LevelFilter::OFF);
        }
        if self.verbosity > 0 {
            let idx = usize::from(self.verbosity).min(VERBOSITY_LEVELS.len() - 1);
            return Ok(VERBOSITY_LEVELS[idx]);
        }
        if self.level.is_empty() {
            return Ok(LevelFilter::INFO);
        }
        let level = parse_level(&self.level)?;
        if is_verbose(level) {
            self.verbosity = 1;
        }
        Ok(level)
    }

    /// The level currently stored in `level`; `info` when unset.
    pub fn level_filter(&self) -> Result<LevelFilter, SetupError> {
        if self.level.is_empty() {
            Ok(LevelFilter::INFO)
        } else {
            parse_level(&self.level)
        }
    }

    /// True when the console sink is enabled.
    #[inline]
    pub fn console_enabled(&self) -> bool {
        self.verbosity > 0 && !self.quiet
    }

    /// Returns the log file location, treating an empty path as unset.
    #[inline]
    pub fn file_location(&self) -> Option<&Path> {
        self.file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Decides whether an interactive UI may be used given the terminal situation.
    ///
    /// Piped stdin, a non-terminal stderr or any verbosity rule interactive UIs out.
    pub fn allow_ui(config: Option<&Self>, terminal: TerminalProbe) -> bool {
        if terminal.stdin_piped {
            return false;
        }
        let Some(cfg) = config else {
            return true;
        };
        if !terminal.stderr_tty {
            return false;
        }
        cfg.verbosity == 0
    }
}

/// Snapshot of the process' terminal situation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerminalProbe {
    /// Stdin is a named pipe.
    pub stdin_piped: bool,
    /// Stdout is a terminal.
    pub stdout_tty: bool,
    /// Stderr is a terminal.
    pub stderr_tty: bool,
}

impl TerminalProbe {
    /// Inspects the current process.
    pub fn detect() -> Self {
        use std::io::IsTerminal;

        Self {
            stdin_piped: stdin_is_pipe(),
            stdout_tty: std::io::stdout().is_terminal(),
            stderr_tty: std::io::stderr().is_terminal(),
        }
    }
}

#[cfg(unix)]
fn stdin_is_pipe() -> bool {
    use std::os::unix::fs::FileTypeExt;

    // unknown is treated as piped so interactive UIs stay off
    std::fs::metadata("/dev/stdin")
        .map(|m| m.file_type().is_fifo())
        .unwrap_or(true)
}

#[cfg(not(unix))]
fn stdin_is_pipe() -> bool {
    false
}

/// Parses a level hint (case-insensitive).
pub fn parse_level(s: &str) -> Result<LevelFilter, SetupError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "error" | "err" | "e" => Ok(LevelFilter::ERROR),
        "warn" | "warning" | "w" => Ok(LevelFilter::WARN),
        "info" | "i" => Ok(LevelFilter::INFO),
        "debug" | "d" => Ok(LevelFilter::DEBUG),
        "trace" | "t" => Ok(LevelFilter::TRACE),
        "disabled" | "off" | "none" | "silent" => Ok(LevelFilter::OFF),
        _ => Err(SetupError::InvalidLevel {
            level: s.to_string(),
        }),
    }
}

fn level_name(level: LevelFilter) -> &'static str {
    match level.into_level() {
        None => "disabled",
        Some(level) if level == tracing::Level::ERROR => "error",
        Some(level) if level == tracing::Level::WARN => "warn",
        Some(level) if level == tracing::Level::INFO => "info",
        Some(level) if level == tracing::Level::DEBUG => "debug",
        Some(_) => "trace",
    }
}

fn is_verbose(level: LevelFilter) -> bool {
    level >= LevelFilter::INFO
}

/// Builds the application logger from `config`.
///
/// No logging config or no enabled sink yields [`Dispatch::none`].
pub fn default_logger(config: &Config) -> Result<Dispatch, SetupError> {
    let Some(cfg) = config.log.as_ref() else {
        return Ok(Dispatch::none());
    };
    let level = cfg.level_filter()?;

    let file = match cfg.file_location() {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };
    if !cfg.console_enabled() && file.is_none() {
        return Ok(Dispatch::none());
    }

    let console = cfg
        .console_enabled()
        .then(|| fmt::layer().with_writer(std::io::stderr));
    let file = file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));

    let subscriber = tracing_subscriber::registry()
        .with(level)
        .with(console)
        .with(file);
    Ok(Dispatch::new(subscriber))
}
