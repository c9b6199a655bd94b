//! Dependency graph engine
//!
//! Edges are directed `task_id -> depends_on_id`. The edge set is kept
//! acyclic: before an edge is inserted, the engine checks whether `task_id`
//! is already reachable from `depends_on_id`. Because the graph is acyclic
//! going in, that single reachability probe is both necessary and
//! sufficient.
//!
//! The check loads the whole edge set once and walks an in-memory adjacency
//! map. Check-then-insert is not locked; the bundled stores reject a
//! duplicate ordered pair on insert, which closes the duplicate race but not
//! a cycle race between two different concurrent edges.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::Dependency;
use crate::store::{DependencyFilter, EntityStore, TaskFilter};

/// Outgoing adjacency: task id -> ids it depends on
pub type Adjacency = HashMap<String, Vec<String>>;

pub fn adjacency<'a>(edges: impl IntoIterator<Item = &'a Dependency>) -> Adjacency {
    let mut map: Adjacency = HashMap::new();
    for edge in edges {
        map.entry(edge.task_id.clone())
            .or_default()
            .push(edge.depends_on_id.clone());
    }
    map
}

/// Whether `target` is reachable from `start` following dependency edges.
///
/// Each node is expanded at most once, so a pre-existing cycle cannot hang
/// the walk.
pub fn reaches(adjacency: &Adjacency, start: &str, target: &str) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![start];

    while let Some(current) = stack.pop() {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = adjacency.get(current) {
            for dep in next {
                if !visited.contains(dep.as_str()) {
                    stack.push(dep.as_str());
                }
            }
        }
    }

    false
}

#[derive(Clone)]
pub struct DependencyGraph {
    store: Arc<dyn EntityStore>,
}

impl DependencyGraph {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Add the edge `task_id -> depends_on_id`.
    ///
    /// Checks, in order: self-edge, both tasks exist, duplicate pair, cycle.
    pub async fn add_dependency(&self, task_id: &str, depends_on_id: &str) -> Result<Dependency> {
        if task_id == depends_on_id {
            return Err(Error::Validation(
                "A task cannot depend on itself".to_string(),
            ));
        }

        self.assert_task_exists(task_id, "Task").await?;
        self.assert_task_exists(depends_on_id, "Dependency task").await?;

        if self
            .store
            .find_dependency(task_id, depends_on_id)
            .await?
            .is_some()
        {
            return Err(Error::Conflict("Dependency already exists".to_string()));
        }

        if self.would_create_cycle(task_id, depends_on_id).await? {
            tracing::debug!(task_id, depends_on_id, "rejected cycle-inducing edge");
            return Err(Error::Validation(
                "Adding this dependency would create a cycle".to_string(),
            ));
        }

        let dependency = Dependency {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            depends_on_id: depends_on_id.to_string(),
            created_at: Utc::now(),
        };
        self.store.insert_dependency(dependency.clone()).await?;
        tracing::info!(id = %dependency.id, task_id, depends_on_id, "dependency added");

        Ok(dependency)
    }

    /// Remove the edge `task_id -> depends_on_id`.
    pub async fn remove_dependency(&self, task_id: &str, depends_on_id: &str) -> Result<()> {
        let existing = self
            .store
            .find_dependency(task_id, depends_on_id)
            .await?
            .ok_or_else(|| {
                Error::not_found("Dependency", format!("{task_id} -> {depends_on_id}"))
            })?;

        self.store.delete_dependency(&existing.id).await?;
        tracing::info!(id = %existing.id, task_id, depends_on_id, "dependency removed");
        Ok(())
    }

    /// Whether adding `task_id -> depends_on_id` would close a cycle.
    pub async fn would_create_cycle(&self, task_id: &str, depends_on_id: &str) -> Result<bool> {
        let edges = self
            .store
            .list_dependencies(&DependencyFilter::default())
            .await?;
        Ok(reaches(&adjacency(&edges), depends_on_id, task_id))
    }

    /// Ids `task_id` depends on, in store order.
    pub async fn depends_on(&self, task_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .list_dependencies(&DependencyFilter::from_task(task_id))
            .await?
            .into_iter()
            .map(|dep| dep.depends_on_id)
            .collect())
    }

    /// Ids of tasks that depend on `task_id`, in store order.
    pub async fn blocks(&self, task_id: &str) -> Result<Vec<String>> {
        Ok(self
            .store
            .list_dependencies(&DependencyFilter::onto_task(task_id))
            .await?
            .into_iter()
            .map(|dep| dep.task_id)
            .collect())
    }

    /// Tasks with at least one unresolved prerequisite.
    pub async fn blocked_task_ids(&self) -> Result<HashSet<String>> {
        let tasks = self.store.list_tasks(&TaskFilter::default()).await?;
        let resolved: HashSet<&str> = tasks
            .iter()
            .filter(|task| task.status.is_resolved())
            .map(|task| task.id.as_str())
            .collect();
        let edges = self
            .store
            .list_dependencies(&DependencyFilter::default())
            .await?;

        Ok(edges
            .into_iter()
            .filter(|edge| !resolved.contains(edge.depends_on_id.as_str()))
            .map(|edge| edge.task_id)
            .collect())
    }

    async fn assert_task_exists(&self, task_id: &str, label: &'static str) -> Result<()> {
        if self.store.get_task(task_id).await?.is_none() {
            return Err(Error::not_found(label, task_id));
        }
        Ok(())
    }
}
