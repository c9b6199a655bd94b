#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_cmd::Command;
use tempfile::TempDir;
use trek::model::NewTask;
use trek::{Config, MemoryStore, Tracker};

/// A temporary trek root for driving the binary
pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(".trek.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn store_file(&self) -> PathBuf {
        self.dir.path().join(".trek").join("store.json")
    }

    /// `trek --root <tmp>` with logging silenced
    pub fn trek(&self) -> Command {
        let mut cmd = Command::cargo_bin("trek").expect("binary");
        cmd.arg("--root").arg(self.path()).env_remove("RUST_LOG");
        cmd
    }

    /// Run with `--json` and return the `data` field of a success envelope
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .trek()
            .arg("--json")
            .args(args)
            .output()
            .expect("run trek");
        assert!(
            output.status.success(),
            "trek {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        let envelope: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("json envelope");
        assert_eq!(envelope["status"], "success");
        envelope["data"].clone()
    }
}

pub fn memory_tracker() -> (Arc<MemoryStore>, Tracker) {
    let store = Arc::new(MemoryStore::new("test"));
    let tracker = Tracker::new(store.clone(), Config::default());
    (store, tracker)
}

pub async fn add_task(tracker: &Tracker, title: &str) -> String {
    tracker
        .create_task(NewTask::titled(title))
        .await
        .expect("create task")
        .task
        .id
}

pub async fn add_subtask(tracker: &Tracker, title: &str, parent: &str) -> String {
    tracker
        .create_task(NewTask {
            parent_task_id: Some(parent.to_string()),
            ..NewTask::titled(title)
        })
        .await
        .expect("create subtask")
        .task
        .id
}
