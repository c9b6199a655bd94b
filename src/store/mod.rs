//! Entity store adapter
//!
//! The engines never touch storage directly; they read and write rows
//! through [`EntityStore`]. Every operation is keyed by the entity's stable
//! id and is atomic on its own. There are no multi-row transactions.
//!
//! Two adapters share the same in-process [`StoreDocument`]:
//! - [`MemoryStore`]: the document behind an async lock
//! - [`FileStore`]: the document persisted as `.trek/store.json`

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::{Comment, Dependency, Epic, Project, Task, TaskStatus};

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

pub const STORE_SCHEMA_VERSION: &str = "trek.store.v1";

/// Row filter for task listings; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub epic_id: Option<String>,
    pub parent_task_id: Option<String>,
}

impl TaskFilter {
    pub fn children_of(parent_task_id: impl Into<String>) -> Self {
        Self {
            parent_task_id: Some(parent_task_id.into()),
            ..Self::default()
        }
    }

    fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
            && self
                .epic_id
                .as_deref()
                .map_or(true, |epic| task.epic_id.as_deref() == Some(epic))
            && self
                .parent_task_id
                .as_deref()
                .map_or(true, |parent| task.parent_task_id.as_deref() == Some(parent))
    }
}

/// Row filter for dependency edges; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct DependencyFilter {
    /// Edges whose dependent is this task
    pub task_id: Option<String>,
    /// Edges whose prerequisite is this task
    pub depends_on_id: Option<String>,
}

impl DependencyFilter {
    pub fn from_task(task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            depends_on_id: None,
        }
    }

    pub fn onto_task(depends_on_id: impl Into<String>) -> Self {
        Self {
            task_id: None,
            depends_on_id: Some(depends_on_id.into()),
        }
    }

    fn matches(&self, dep: &Dependency) -> bool {
        self.task_id.as_deref().map_or(true, |id| dep.task_id == id)
            && self
                .depends_on_id
                .as_deref()
                .map_or(true, |id| dep.depends_on_id == id)
    }
}

/// Point-in-time reads and single-row writes of trek entities.
///
/// `list_*` returns rows in the store's native order (insertion order for
/// the bundled adapters). `delete_*` of an absent row is a no-op that
/// returns `false`.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn project(&self) -> Result<Project>;

    async fn get_task(&self, id: &str) -> Result<Option<Task>>;
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;
    async fn insert_task(&self, task: Task) -> Result<()>;
    /// Replace an existing row with the same id
    async fn update_task(&self, task: Task) -> Result<()>;
    async fn delete_task(&self, id: &str) -> Result<bool>;

    async fn get_epic(&self, id: &str) -> Result<Option<Epic>>;
    async fn list_epics(&self) -> Result<Vec<Epic>>;
    async fn insert_epic(&self, epic: Epic) -> Result<()>;
    async fn update_epic(&self, epic: Epic) -> Result<()>;
    async fn delete_epic(&self, id: &str) -> Result<bool>;

    /// Look up the edge `task_id -> depends_on_id`
    async fn find_dependency(&self, task_id: &str, depends_on_id: &str)
        -> Result<Option<Dependency>>;
    async fn list_dependencies(&self, filter: &DependencyFilter) -> Result<Vec<Dependency>>;
    /// Insert an edge; a duplicate ordered pair is a `Conflict`
    async fn insert_dependency(&self, dep: Dependency) -> Result<()>;
    async fn delete_dependency(&self, id: &str) -> Result<bool>;

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>>;
    async fn list_comments(&self, task_id: &str) -> Result<Vec<Comment>>;
    async fn insert_comment(&self, comment: Comment) -> Result<()>;
    async fn delete_comment(&self, id: &str) -> Result<bool>;
}

/// Full store contents, kept in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    pub schema_version: String,
    pub project: Project,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub epics: Vec<Epic>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl StoreDocument {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION.to_string(),
            project: Project {
                id: Uuid::new_v4().to_string(),
                name: project_name.into(),
                created_at: Utc::now(),
            },
            tasks: Vec::new(),
            epics: Vec::new(),
            dependencies: Vec::new(),
            comments: Vec::new(),
        }
    }

    fn get_task(&self, id: &str) -> Option<Task> {
        self.tasks.iter().find(|task| task.id == id).cloned()
    }

    fn list_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect()
    }

    fn insert_task(&mut self, task: Task) -> Result<()> {
        if self.tasks.iter().any(|existing| existing.id == task.id) {
            return Err(Error::Conflict(format!("task already exists: {}", task.id)));
        }
        self.tasks.push(task);
        Ok(())
    }

    fn update_task(&mut self, task: Task) -> Result<()> {
        let slot = self
            .tasks
            .iter_mut()
            .find(|existing| existing.id == task.id)
            .ok_or_else(|| Error::not_found("Task", task.id.clone()))?;
        *slot = task;
        Ok(())
    }

    fn delete_task(&mut self, id: &str) -> bool {
        remove_where(&mut self.tasks, |task| task.id == id)
    }

    fn get_epic(&self, id: &str) -> Option<Epic> {
        self.epics.iter().find(|epic| epic.id == id).cloned()
    }

    fn insert_epic(&mut self, epic: Epic) -> Result<()> {
        if self.epics.iter().any(|existing| existing.id == epic.id) {
            return Err(Error::Conflict(format!("epic already exists: {}", epic.id)));
        }
        self.epics.push(epic);
        Ok(())
    }

    fn update_epic(&mut self, epic: Epic) -> Result<()> {
        let slot = self
            .epics
            .iter_mut()
            .find(|existing| existing.id == epic.id)
            .ok_or_else(|| Error::not_found("Epic", epic.id.clone()))?;
        *slot = epic;
        Ok(())
    }

    fn delete_epic(&mut self, id: &str) -> bool {
        remove_where(&mut self.epics, |epic| epic.id == id)
    }

    fn find_dependency(&self, task_id: &str, depends_on_id: &str) -> Option<Dependency> {
        self.dependencies
            .iter()
            .find(|dep| dep.task_id == task_id && dep.depends_on_id == depends_on_id)
            .cloned()
    }

    fn list_dependencies(&self, filter: &DependencyFilter) -> Vec<Dependency> {
        self.dependencies
            .iter()
            .filter(|dep| filter.matches(dep))
            .cloned()
            .collect()
    }

    fn insert_dependency(&mut self, dep: Dependency) -> Result<()> {
        if self.find_dependency(&dep.task_id, &dep.depends_on_id).is_some() {
            return Err(Error::Conflict("Dependency already exists".to_string()));
        }
        self.dependencies.push(dep);
        Ok(())
    }

    fn delete_dependency(&mut self, id: &str) -> bool {
        remove_where(&mut self.dependencies, |dep| dep.id == id)
    }

    fn get_comment(&self, id: &str) -> Option<Comment> {
        self.comments.iter().find(|comment| comment.id == id).cloned()
    }

    fn list_comments(&self, task_id: &str) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|comment| comment.task_id == task_id)
            .cloned()
            .collect();
        comments.sort_by_key(|comment| comment.created_at);
        comments
    }

    fn insert_comment(&mut self, comment: Comment) -> Result<()> {
        if self.comments.iter().any(|existing| existing.id == comment.id) {
            return Err(Error::Conflict(format!(
                "comment already exists: {}",
                comment.id
            )));
        }
        self.comments.push(comment);
        Ok(())
    }

    fn delete_comment(&mut self, id: &str) -> bool {
        remove_where(&mut self.comments, |comment| comment.id == id)
    }
}

fn remove_where<T>(rows: &mut Vec<T>, predicate: impl Fn(&T) -> bool) -> bool {
    let before = rows.len();
    rows.retain(|row| !predicate(row));
    rows.len() != before
}
