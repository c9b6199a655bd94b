//! Event stream publisher.
//!
//! A publisher owns one [`ChangeNotifier`] and pushes its output to a single
//! subscriber over a tokio channel: a `connected` message first, then every
//! change event stamped with its emission time. Messages can be written as
//! JSON lines to stdout or a file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::changes::{ChangeEvent, ChangeNotifier};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventDestination {
    Stdout,
    File(PathBuf),
}

impl EventDestination {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "-" {
                return Some(EventDestination::Stdout);
            }
            Some(EventDestination::File(PathBuf::from(trimmed)))
        })
    }

    pub fn open(&self) -> Result<EventSink> {
        match self {
            EventDestination::Stdout => Ok(EventSink::stdout()),
            EventDestination::File(path) => EventSink::file(path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Control {
    Connected,
}

/// A change event with the time it was sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimestampedEvent {
    #[serde(flatten)]
    pub event: ChangeEvent,
    pub timestamp: DateTime<Utc>,
}

/// One message on the subscriber channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StreamMessage {
    Control(Control),
    Change(TimestampedEvent),
}

impl StreamMessage {
    pub fn connected() -> Self {
        StreamMessage::Control(Control::Connected)
    }

    pub fn change(event: ChangeEvent) -> Self {
        StreamMessage::Change(TimestampedEvent {
            event,
            timestamp: Utc::now(),
        })
    }

    pub fn as_change(&self) -> Option<&ChangeEvent> {
        match self {
            StreamMessage::Change(stamped) => Some(&stamped.event),
            StreamMessage::Control(_) => None,
        }
    }
}

pub struct Publisher {
    notifier: ChangeNotifier,
    interval: Duration,
}

impl Publisher {
    pub fn new(notifier: ChangeNotifier, interval: Duration) -> Self {
        Self { notifier, interval }
    }

    /// Serve one subscriber until its receiver is dropped.
    ///
    /// Returns the number of change events delivered. A failed poll is
    /// logged and the next tick tries again.
    pub async fn run(mut self, tx: mpsc::Sender<StreamMessage>) -> usize {
        self.notifier.initialize().await;
        if tx.send(StreamMessage::connected()).await.is_err() {
            return 0;
        }
        tracing::debug!(interval_ms = self.interval.as_millis() as u64, "subscriber connected");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; polling starts one period in.
        ticker.tick().await;

        let mut delivered = 0;
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                _ = ticker.tick() => {}
            }

            let events = match self.notifier.compute_changes().await {
                Ok(events) => events,
                Err(err) => {
                    tracing::warn!(error = %err, "change poll failed");
                    continue;
                }
            };
            for event in events {
                if tx.send(StreamMessage::change(event)).await.is_err() {
                    tracing::debug!(delivered, "subscriber went away mid-batch");
                    return delivered;
                }
                delivered += 1;
            }
        }

        tracing::debug!(delivered, "subscriber disconnected");
        delivered
    }
}

/// Event sink that writes JSONL output to a destination.
pub struct EventSink {
    writer: Box<dyn Write + Send>,
}

impl EventSink {
    pub fn stdout() -> Self {
        Self {
            writer: Box::new(std::io::stdout()),
        }
    }

    /// Append to a file, creating it if necessary.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: Box::new(file),
        })
    }

    /// Write one message as a JSON line.
    pub fn emit<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let serialized = serde_json::to_vec(message)?;
        self.writer.write_all(&serialized)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().map_err(Error::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::timeout;

    use crate::model::{NewTask, TaskStatus};
    use crate::store::MemoryStore;
    use crate::{Config, Tracker};

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn destination_parsing() {
        assert_eq!(EventDestination::parse(None), None);
        assert_eq!(EventDestination::parse(Some("  ")), None);
        assert_eq!(
            EventDestination::parse(Some("-")),
            Some(EventDestination::Stdout)
        );
        assert_eq!(
            EventDestination::parse(Some("events.jsonl")),
            Some(EventDestination::File(PathBuf::from("events.jsonl")))
        );
    }

    #[test]
    fn wire_shapes() {
        let connected = serde_json::to_value(StreamMessage::connected()).unwrap();
        assert_eq!(connected, serde_json::json!({ "type": "connected" }));

        let change = serde_json::to_value(StreamMessage::change(ChangeEvent::TaskUpdated {
            task_id: "TREK-1".to_string(),
            task_title: "Ship".to_string(),
            status: TaskStatus::Completed,
        }))
        .unwrap();
        assert_eq!(change["type"], "task_updated");
        assert_eq!(change["taskId"], "TREK-1");
        assert_eq!(change["status"], "completed");
        assert!(change["timestamp"].as_str().is_some());
    }

    #[test]
    fn file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let mut sink = EventDestination::File(path.clone()).open().unwrap();
        sink.emit(&StreamMessage::connected()).unwrap();
        sink.emit(&StreamMessage::connected()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn connected_comes_first_then_changes() {
        let store = Arc::new(MemoryStore::new("events"));
        let tracker = Tracker::new(store, Config::default());
        let publisher = Publisher::new(tracker.notifier(), Duration::from_millis(10));

        let (tx, mut rx) = mpsc::channel(16);
        let handle = tokio::spawn(publisher.run(tx));

        let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(first, StreamMessage::connected());

        let task = tracker.create_task(NewTask::titled("Watch me")).await.unwrap();
        let next = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        match next.as_change() {
            Some(ChangeEvent::TaskCreated { task_id, .. }) => assert_eq!(task_id, &task.task.id),
            other => panic!("unexpected message: {other:?}"),
        }

        drop(rx);
        let delivered = timeout(WAIT, handle).await.unwrap().unwrap();
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn stops_when_subscriber_is_gone() {
        let store = Arc::new(MemoryStore::new("events"));
        let tracker = Tracker::new(store, Config::default());
        let publisher = Publisher::new(tracker.notifier(), Duration::from_secs(3600));

        let (tx, mut rx) = mpsc::channel(16);
        let handle = tokio::spawn(publisher.run(tx));
        assert_eq!(
            timeout(WAIT, rx.recv()).await.unwrap(),
            Some(StreamMessage::connected())
        );

        drop(rx);
        assert_eq!(timeout(WAIT, handle).await.unwrap().unwrap(), 0);
    }
}
