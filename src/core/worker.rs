//! Background worker plumbing.
//!
//! A worker reports to the [`EventLoop`](super::EventLoop) over a bounded channel:
//! `Ok(())` messages are heartbeats, an `Err` is terminal, and closing the channel
//! means the worker is done.

use std::future::Future;

use tokio::sync::mpsc;

use crate::error::BoxError;

/// Message sent by a background worker: `Ok(())` is a heartbeat, `Err` the terminal failure.
pub type WorkerResult = Result<(), BoxError>;

/// Runs `work` on the tokio runtime and returns the channel the event loop reads.
///
/// The channel carries the worker's error (if any) and closes once `work` completes.
pub fn spawn_worker<F>(work: F) -> mpsc::Receiver<WorkerResult>
where
    F: Future<Output = WorkerResult> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        if let Err(err) = work.await {
            // receiver gone means the loop already stopped
            let _ = tx.send(Err(err)).await;
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_closes_without_message() {
        let mut rx = spawn_worker(async { Ok(()) });
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn failure_is_forwarded_then_closed() {
        let mut rx = spawn_worker(async { Err("disk full".into()) });

        let err = rx.recv().await.expect("message").unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn question_mark_converts_into_worker_error() {
        async fn read_missing() -> WorkerResult {
            std::fs::read("/definitely/not/here")?;
            Ok(())
        }

        let mut rx = spawn_worker(read_missing());
        assert!(matches!(rx.recv().await, Some(Err(_))));
    }
}
