//! trek watch command implementation
//!
//! Runs one publisher against the store and writes its messages as JSON
//! lines until Ctrl-C.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use super::Context;
use crate::error::{Error, Result};
use crate::events::{EventDestination, EventSink, Publisher, StreamMessage};

const CHANNEL_CAPACITY: usize = 64;

pub async fn run(ctx: &Context, interval_ms: Option<u64>, events: &str) -> Result<()> {
    let interval = match interval_ms {
        Some(0) => {
            return Err(Error::Validation(
                "--interval-ms must be greater than 0".to_string(),
            ))
        }
        Some(ms) => Duration::from_millis(ms),
        None => ctx.tracker.config().events.poll_interval(),
    };
    let destination = EventDestination::parse(Some(events)).unwrap_or(EventDestination::Stdout);
    let mut sink = destination.open()?;

    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
    let publisher = Publisher::new(ctx.tracker.notifier(), interval);
    let handle = tokio::spawn(publisher.run(tx));
    tracing::info!(?destination, interval_ms = interval.as_millis() as u64, "watching for changes");

    let result = forward(&mut rx, &mut sink, tokio::signal::ctrl_c()).await;

    drop(rx);
    match handle.await {
        Ok(delivered) => tracing::info!(delivered, "watch stopped"),
        Err(err) => tracing::warn!(error = %err, "publisher task failed"),
    }
    let written = result?;
    tracing::debug!(written, "sink closed");
    Ok(())
}

/// Write messages to `sink` until the publisher hangs up or `shutdown`
/// resolves. `shutdown` is created once and polled on every iteration.
async fn forward<F>(
    rx: &mut mpsc::Receiver<StreamMessage>,
    sink: &mut EventSink,
    shutdown: F,
) -> Result<usize>
where
    F: Future,
{
    tokio::pin!(shutdown);
    let mut written = 0;

    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(message) => {
                    sink.emit(&message)?;
                    written += 1;
                }
                None => return Ok(written),
            },
            _ = &mut shutdown => return Ok(written),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn shutdown_stops_forwarding_while_publisher_is_alive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut sink = EventSink::file(&path).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let sender = tokio::spawn(async move {
            tx.send(StreamMessage::connected()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            stop_tx.send(()).unwrap();
            // Hold the channel open past shutdown.
            tokio::time::sleep(Duration::from_millis(200)).await;
            drop(tx);
        });

        let written = timeout(WAIT, forward(&mut rx, &mut sink, stop_rx))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(written, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().collect::<Vec<_>>(), vec![r#"{"type":"connected"}"#]);
        sender.await.unwrap();
    }

    #[tokio::test]
    async fn publisher_hangup_ends_forwarding() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = EventSink::file(&dir.path().join("events.jsonl")).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        tx.send(StreamMessage::connected()).await.unwrap();
        tx.send(StreamMessage::connected()).await.unwrap();
        drop(tx);

        let written = timeout(WAIT, forward(&mut rx, &mut sink, std::future::pending::<()>()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(written, 2);
    }
}
