//! Change notification engine
//!
//! Keeps the last observed `{id, status, title, updated_at}` of every task
//! and epic, diffs it against a fresh full read, and reports what was
//! created, updated or deleted in between.
//!
//! The notifier is single-owner state: mutating calls take `&mut self` and
//! the type is not `Clone`, so only the loop that owns it can advance the
//! snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Epic, EpicStatus, Task, TaskStatus};
use crate::store::{EntityStore, TaskFilter};

/// Semantic change between two snapshots.
///
/// Serializes as `{"type": "task_created", "taskId": .., "taskTitle": .., "status": ..}`;
/// deletions carry the last known title and no status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChangeEvent {
    TaskCreated {
        task_id: String,
        task_title: String,
        status: TaskStatus,
    },
    TaskUpdated {
        task_id: String,
        task_title: String,
        status: TaskStatus,
    },
    TaskDeleted {
        task_id: String,
        task_title: String,
    },
    EpicCreated {
        epic_id: String,
        epic_title: String,
        status: EpicStatus,
    },
    EpicUpdated {
        epic_id: String,
        epic_title: String,
        status: EpicStatus,
    },
    EpicDeleted {
        epic_id: String,
        epic_title: String,
    },
}

impl ChangeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::TaskCreated { .. } => "task_created",
            ChangeEvent::TaskUpdated { .. } => "task_updated",
            ChangeEvent::TaskDeleted { .. } => "task_deleted",
            ChangeEvent::EpicCreated { .. } => "epic_created",
            ChangeEvent::EpicUpdated { .. } => "epic_updated",
            ChangeEvent::EpicDeleted { .. } => "epic_deleted",
        }
    }

    /// Id of the task or epic the event is about
    pub fn entity_id(&self) -> &str {
        match self {
            ChangeEvent::TaskCreated { task_id, .. }
            | ChangeEvent::TaskUpdated { task_id, .. }
            | ChangeEvent::TaskDeleted { task_id, .. } => task_id,
            ChangeEvent::EpicCreated { epic_id, .. }
            | ChangeEvent::EpicUpdated { epic_id, .. }
            | ChangeEvent::EpicDeleted { epic_id, .. } => epic_id,
        }
    }
}

/// Last observed state of one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub id: String,
    pub status: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// Snapshots in read order, indexed by id
#[derive(Debug, Default)]
struct SnapshotMap {
    entries: Vec<EntitySnapshot>,
    index: HashMap<String, usize>,
}

impl SnapshotMap {
    fn from_entities<T: Observed>(entities: &[T]) -> Self {
        let mut map = SnapshotMap::default();
        for entity in entities {
            let snapshot = entity.snapshot();
            match map.index.get(&snapshot.id) {
                Some(&slot) => map.entries[slot] = snapshot,
                None => {
                    map.index.insert(snapshot.id.clone(), map.entries.len());
                    map.entries.push(snapshot);
                }
            }
        }
        map
    }

    fn get(&self, id: &str) -> Option<&EntitySnapshot> {
        self.index.get(id).map(|&slot| &self.entries[slot])
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

trait Observed {
    fn id(&self) -> &str;
    fn updated_at(&self) -> DateTime<Utc>;
    fn snapshot(&self) -> EntitySnapshot;
    fn created(&self) -> ChangeEvent;
    fn updated(&self) -> ChangeEvent;
    fn deleted(last: &EntitySnapshot) -> ChangeEvent;
}

impl Observed for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id.clone(),
            status: self.status.to_string(),
            title: self.title.clone(),
            updated_at: self.updated_at,
        }
    }

    fn created(&self) -> ChangeEvent {
        ChangeEvent::TaskCreated {
            task_id: self.id.clone(),
            task_title: self.title.clone(),
            status: self.status,
        }
    }

    fn updated(&self) -> ChangeEvent {
        ChangeEvent::TaskUpdated {
            task_id: self.id.clone(),
            task_title: self.title.clone(),
            status: self.status,
        }
    }

    fn deleted(last: &EntitySnapshot) -> ChangeEvent {
        ChangeEvent::TaskDeleted {
            task_id: last.id.clone(),
            task_title: last.title.clone(),
        }
    }
}

impl Observed for Epic {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id.clone(),
            status: self.status.to_string(),
            title: self.title.clone(),
            updated_at: self.updated_at,
        }
    }

    fn created(&self) -> ChangeEvent {
        ChangeEvent::EpicCreated {
            epic_id: self.id.clone(),
            epic_title: self.title.clone(),
            status: self.status,
        }
    }

    fn updated(&self) -> ChangeEvent {
        ChangeEvent::EpicUpdated {
            epic_id: self.id.clone(),
            epic_title: self.title.clone(),
            status: self.status,
        }
    }

    fn deleted(last: &EntitySnapshot) -> ChangeEvent {
        ChangeEvent::EpicDeleted {
            epic_id: last.id.clone(),
            epic_title: last.title.clone(),
        }
    }
}

/// Created/updated in `current` order, then deletions in `previous` order.
fn diff<T: Observed>(previous: &SnapshotMap, current: &[T], events: &mut Vec<ChangeEvent>) {
    for entity in current {
        match previous.get(entity.id()) {
            None => events.push(entity.created()),
            Some(last) if last.updated_at != entity.updated_at() => events.push(entity.updated()),
            Some(_) => {}
        }
    }

    let current_ids: std::collections::HashSet<&str> =
        current.iter().map(|entity| entity.id()).collect();
    for last in &previous.entries {
        if !current_ids.contains(last.id.as_str()) {
            events.push(T::deleted(last));
        }
    }
}

pub struct ChangeNotifier {
    store: Arc<dyn EntityStore>,
    tasks: SnapshotMap,
    epics: SnapshotMap,
    primed: bool,
}

impl ChangeNotifier {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            tasks: SnapshotMap::default(),
            epics: SnapshotMap::default(),
            primed: false,
        }
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Take the first snapshot.
    ///
    /// No-op once primed. A failed read is logged and swallowed; the
    /// notifier stays uninitialized and the next call retries.
    pub async fn initialize(&mut self) {
        if self.primed {
            return;
        }
        match self.read_all().await {
            Ok((tasks, epics)) => {
                self.replace(&tasks, &epics);
                tracing::debug!(
                    tasks = self.tasks.len(),
                    epics = self.epics.len(),
                    "change notifier primed"
                );
            }
            Err(err) => {
                tracing::debug!(error = %err, "change notifier initialization deferred");
            }
        }
    }

    /// Diff a fresh read against the snapshot, then replace the snapshot.
    ///
    /// From the uninitialized state every entity is reported as created.
    /// A failed read returns the error and leaves the snapshot untouched.
    pub async fn compute_changes(&mut self) -> Result<Vec<ChangeEvent>> {
        let (tasks, epics) = self.read_all().await?;

        let mut events = Vec::new();
        diff(&self.tasks, &tasks, &mut events);
        diff(&self.epics, &epics, &mut events);

        self.replace(&tasks, &epics);
        Ok(events)
    }

    pub fn task_snapshot(&self, id: &str) -> Option<&EntitySnapshot> {
        self.tasks.get(id)
    }

    pub fn epic_snapshot(&self, id: &str) -> Option<&EntitySnapshot> {
        self.epics.get(id)
    }

    async fn read_all(&self) -> Result<(Vec<Task>, Vec<Epic>)> {
        let filter = TaskFilter::default();
        tokio::try_join!(self.store.list_tasks(&filter), self.store.list_epics())
    }

    fn replace(&mut self, tasks: &[Task], epics: &[Epic]) {
        self.tasks = SnapshotMap::from_entities(tasks);
        self.epics = SnapshotMap::from_entities(epics);
        self.primed = true;
    }
}
