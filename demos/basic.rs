//! # Example: progress bar UI with a log fallback
//!
//! Demonstrates:
//! - bootstrapping an [`Application`] from a [`SetupConfig`];
//! - a custom [`Ui`] that falls back to [`LogUi`] when stderr is not a terminal;
//! - a worker publishing progress events and finishing with an exit event;
//! - Ctrl-C cancelling the run with a forced teardown.
//!
//! ## Flow
//! ```text
//! worker ──► publish(progress 0..=100) ──► publish(exit)
//!                    │
//!                    ▼
//!             EventLoop ──► ProgressUi::handle (or LogUi when not a terminal)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic            # progress bar
//! cargo run --example basic -- -v       # verbose: LogUi writes each event to stderr
//! ```

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use appvisor::{
    Application, Event, Identification, LogUi, LoggingConfig, SetupConfig, TerminalProbe, Ui,
    UiError, Unsubscriber, Value, spawn_worker,
};
use async_trait::async_trait;

/// Single-line progress bar on stderr.
#[derive(Default)]
struct ProgressUi {
    last: AtomicI64,
}

#[async_trait]
impl Ui for ProgressUi {
    async fn setup(&self, _unsubscribe: Unsubscriber) -> Result<(), UiError> {
        if !TerminalProbe::detect().stderr_tty {
            return Err(UiError::unavailable("stderr is not a terminal"));
        }
        Ok(())
    }

    async fn handle(&self, event: &Event) -> Result<(), UiError> {
        if event.kind.as_str() != "progress" {
            return Ok(());
        }
        let Some(Value::Number(pct)) = event.value else {
            return Ok(());
        };
        self.last.store(pct, Ordering::Relaxed);

        let filled = usize::try_from(pct / 5).unwrap_or(0);
        let mut err = std::io::stderr();
        write!(err, "\r[{:<20}] {pct:>3}%", "#".repeat(filled))
            .and_then(|()| err.flush())
            .map_err(|e| UiError::failed(e.to_string()))
    }

    async fn teardown(&self, force: bool) -> Result<(), UiError> {
        let mut err = std::io::stderr();
        let last = self.last.load(Ordering::Relaxed);
        let msg = if force { "interrupted" } else { "done" };
        writeln!(err, "\n{msg} at {last}%").map_err(|e| UiError::failed(e.to_string()))
    }

    fn name(&self) -> &str {
        "progress"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let verbosity = std::env::args().skip(1).filter(|a| a == "-v").count();
    let setup = SetupConfig::new(Identification::new("basic", env!("CARGO_PKG_VERSION")))
        .with_logging_config(LoggingConfig {
            verbosity: u8::try_from(verbosity).unwrap_or(u8::MAX),
            ..Default::default()
        })
        .with_ui(|cfg| {
            let mut uis: Vec<Arc<dyn Ui>> = Vec::new();
            if LoggingConfig::allow_ui(cfg.log.as_ref(), TerminalProbe::detect()) {
                uis.push(Arc::new(ProgressUi::default()));
            }
            uis.push(Arc::new(LogUi::new()));
            Ok(uis)
        });

    let app = Application::new(setup)?;
    let bus = app
        .bus()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("application was built without a bus"))?;

    let worker = spawn_worker(async move {
        for pct in (0..=100_i64).step_by(10) {
            bus.publish(Event::new("progress").with_source("demo").with_value(pct));
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        bus.publish(Event::exit(false));
        Ok(())
    });

    app.run_until_signal(worker).await?;
    Ok(())
}
