//! # LogUi: plain-text fallback renderer
//!
//! A minimal [`Ui`] that writes every incoming [`Event`] to the `tracing` log.
//! Use it as the last candidate so non-interactive runs still report progress.
//!
//! ## Example output
//! ```text
//! INFO appvisor::ui::log: event kind=download-progress source=Some("downloader") value=Some(Number(42))
//! WARN appvisor::ui::log: event carried error kind=scan-failed error=disk full
//! INFO appvisor::ui::log: exit requested interrupt=false
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::UiError;
use crate::events::{Event, Unsubscriber};
use crate::ui::Ui;

/// Event writer UI.
#[derive(Debug, Default)]
pub struct LogUi {
    attached: AtomicBool,
    handled: AtomicU64,
}

impl LogUi {
    /// Construct a new [`LogUi`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events rendered so far.
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    /// True between a successful setup and teardown.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Ui for LogUi {
    async fn setup(&self, _unsubscribe: Unsubscriber) -> Result<(), UiError> {
        self.attached.store(true, Ordering::Relaxed);
        debug!("log ui attached");
        Ok(())
    }

    async fn handle(&self, e: &Event) -> Result<(), UiError> {
        self.handled.fetch_add(1, Ordering::Relaxed);

        if let Some(exit) = e.exit_request() {
            info!(interrupt = exit.interrupt, "exit requested");
            return Ok(());
        }
        match &e.error {
            Some(err) => warn!(kind = %e.kind, error = %err, "event carried error"),
            None => info!(kind = %e.kind, source = ?e.source, value = ?e.value, "event"),
        }
        Ok(())
    }

    async fn teardown(&self, force: bool) -> Result<(), UiError> {
        self.attached.store(false, Ordering::Relaxed);
        debug!(force, handled = self.handled(), "log ui detached");
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_events_across_lifecycle() {
        let ui = LogUi::new();
        ui.setup(Unsubscriber::detached()).await.unwrap();
        assert!(ui.is_attached());

        ui.handle(&Event::new("tick").with_value(1_i64)).await.unwrap();
        ui.handle(&Event::new("failed").with_error(std::io::Error::other("disk full")))
            .await
            .unwrap();
        ui.handle(&Event::exit(true)).await.unwrap();
        assert_eq!(ui.handled(), 3);

        ui.teardown(false).await.unwrap();
        assert!(!ui.is_attached());
    }
}
