//! CRUD service over an entity store.
//!
//! Creates and updates tasks, epics and comments, and routes dependency
//! mutations and deletions through the graph and cascade engines.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::cascade::{CascadeDeleter, CascadeReport};
use crate::changes::ChangeNotifier;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::ids::IdGenerator;
use crate::model::{
    next_timestamp, validate_priority, validate_title, Comment, Dependency, Epic, EpicStatus,
    EpicUpdate, NewComment, NewEpic, NewTask, Task, TaskStatus, TaskUpdate,
};
use crate::store::{DependencyFilter, EntityStore, TaskFilter};

/// A task with its dependency neighbours
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    /// Prerequisites of this task
    pub depends_on: Vec<String>,
    /// Tasks that depend on this one
    pub blocks: Vec<String>,
}

impl TaskView {
    fn enrich(task: Task, edges: &[Dependency]) -> Self {
        let depends_on = edges
            .iter()
            .filter(|edge| edge.task_id == task.id)
            .map(|edge| edge.depends_on_id.clone())
            .collect();
        let blocks = edges
            .iter()
            .filter(|edge| edge.depends_on_id == task.id)
            .map(|edge| edge.task_id.clone())
            .collect();
        Self {
            task,
            depends_on,
            blocks,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveReport {
    pub tasks_archived: usize,
    pub epics_archived: usize,
}

#[derive(Clone)]
pub struct Tracker {
    store: Arc<dyn EntityStore>,
    config: Config,
    ids: IdGenerator,
    graph: DependencyGraph,
    cascade: CascadeDeleter,
}

impl Tracker {
    pub fn new(store: Arc<dyn EntityStore>, config: Config) -> Self {
        Self {
            ids: IdGenerator::new(config.ids.suffix_len),
            graph: DependencyGraph::new(store.clone()),
            cascade: CascadeDeleter::new(store.clone()),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// A fresh, uninitialized notifier over the same store
    pub fn notifier(&self) -> ChangeNotifier {
        ChangeNotifier::new(self.store.clone())
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    pub async fn create_task(&self, input: NewTask) -> Result<TaskView> {
        let title = validate_title(&input.title)?;
        let priority = validate_priority(
            input
                .priority
                .unwrap_or(self.config.tasks.default_priority),
        )?;
        if let Some(epic_id) = input.epic_id.as_deref() {
            self.require_epic(epic_id).await?;
        }
        if let Some(parent_id) = input.parent_task_id.as_deref() {
            self.require_task(parent_id).await?;
        }

        let project = self.store.project().await?;
        let existing = self.store.list_tasks(&TaskFilter::default()).await?;
        let id = self.ids.generate(
            &self.config.ids.task_prefix,
            existing.iter().map(|task| task.id.as_str()),
        );

        let now = Utc::now();
        let task = Task {
            id,
            project_id: project.id,
            epic_id: input.epic_id,
            parent_task_id: input.parent_task_id,
            title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            priority,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_task(task.clone()).await?;
        tracing::info!(id = %task.id, parent = ?task.parent_task_id, "task created");

        Ok(TaskView {
            task,
            depends_on: Vec::new(),
            blocks: Vec::new(),
        })
    }

    pub async fn get_task(&self, id: &str) -> Result<TaskView> {
        let task = self.require_task(id).await?;
        Ok(TaskView {
            depends_on: self.graph.depends_on(id).await?,
            blocks: self.graph.blocks(id).await?,
            task,
        })
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskView>> {
        let tasks = self.store.list_tasks(filter).await?;
        let edges = self
            .store
            .list_dependencies(&DependencyFilter::default())
            .await?;
        Ok(tasks
            .into_iter()
            .map(|task| TaskView::enrich(task, &edges))
            .collect())
    }

    /// Direct children of `id`
    pub async fn subtasks(&self, id: &str) -> Result<Vec<TaskView>> {
        self.require_task(id).await?;
        self.list_tasks(&TaskFilter::children_of(id)).await
    }

    pub async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<TaskView> {
        let mut task = self.require_task(id).await?;
        if let Some(Some(epic_id)) = update.epic_id.as_ref() {
            self.require_epic(epic_id).await?;
        }

        if let Some(title) = update.title {
            task.title = validate_title(&title)?;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = validate_priority(priority)?;
        }
        if let Some(epic_id) = update.epic_id {
            task.epic_id = epic_id;
        }
        if let Some(tags) = update.tags {
            task.tags = tags;
        }
        task.updated_at = next_timestamp(task.updated_at);

        self.store.update_task(task).await?;
        self.get_task(id).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<CascadeReport> {
        self.cascade.delete_task(id).await
    }

    // =========================================================================
    // Epics
    // =========================================================================

    pub async fn create_epic(&self, input: NewEpic) -> Result<Epic> {
        let title = validate_title(&input.title)?;
        let priority = validate_priority(
            input
                .priority
                .unwrap_or(self.config.tasks.default_priority),
        )?;
        let project = self.store.project().await?;
        let existing = self.store.list_epics().await?;
        let id = self.ids.generate(
            &self.config.ids.epic_prefix,
            existing.iter().map(|epic| epic.id.as_str()),
        );

        let now = Utc::now();
        let epic = Epic {
            id,
            project_id: project.id,
            title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            priority,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_epic(epic.clone()).await?;
        tracing::info!(id = %epic.id, "epic created");
        Ok(epic)
    }

    pub async fn get_epic(&self, id: &str) -> Result<Epic> {
        self.require_epic(id).await
    }

    pub async fn list_epics(&self) -> Result<Vec<Epic>> {
        self.store.list_epics().await
    }

    pub async fn update_epic(&self, id: &str, update: EpicUpdate) -> Result<Epic> {
        let mut epic = self.require_epic(id).await?;
        if let Some(title) = update.title {
            epic.title = validate_title(&title)?;
        }
        if let Some(description) = update.description {
            epic.description = description;
        }
        if let Some(status) = update.status {
            epic.status = status;
        }
        if let Some(priority) = update.priority {
            epic.priority = validate_priority(priority)?;
        }
        epic.updated_at = next_timestamp(epic.updated_at);

        self.store.update_epic(epic.clone()).await?;
        Ok(epic)
    }

    /// Delete the epic row; its tasks are orphaned, not deleted. Returns the
    /// orphaned task count.
    pub async fn delete_epic(&self, id: &str) -> Result<usize> {
        self.cascade.delete_epic(id).await
    }

    // =========================================================================
    // Dependencies
    // =========================================================================

    pub async fn add_dependency(&self, task_id: &str, depends_on_id: &str) -> Result<Dependency> {
        self.graph.add_dependency(task_id, depends_on_id).await
    }

    pub async fn remove_dependency(&self, task_id: &str, depends_on_id: &str) -> Result<()> {
        self.graph.remove_dependency(task_id, depends_on_id).await
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn add_comment(&self, task_id: &str, input: NewComment) -> Result<Comment> {
        self.require_task(task_id).await?;
        let author = input.author.trim();
        if author.is_empty() {
            return Err(Error::Validation("author cannot be empty".to_string()));
        }
        if input.content.trim().is_empty() {
            return Err(Error::Validation("content cannot be empty".to_string()));
        }

        let existing = self.store.list_comments(task_id).await?;
        let id = self.ids.generate(
            &self.config.ids.comment_prefix,
            existing.iter().map(|comment| comment.id.as_str()),
        );
        let now = Utc::now();
        let comment = Comment {
            id,
            task_id: task_id.to_string(),
            author: author.to_string(),
            content: input.content,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_comment(comment.clone()).await?;
        Ok(comment)
    }

    /// Comments on a task, oldest first
    pub async fn list_comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        self.require_task(task_id).await?;
        self.store.list_comments(task_id).await
    }

    pub async fn delete_comment(&self, id: &str) -> Result<()> {
        if self.store.get_comment(id).await?.is_none() {
            return Err(Error::not_found("Comment", id));
        }
        self.store.delete_comment(id).await?;
        Ok(())
    }

    // =========================================================================
    // Archive
    // =========================================================================

    /// Move every completed task and epic to `archived`.
    pub async fn archive_completed(&self) -> Result<ArchiveReport> {
        let mut report = ArchiveReport::default();

        let completed = self
            .store
            .list_tasks(&TaskFilter {
                status: Some(TaskStatus::Completed),
                ..TaskFilter::default()
            })
            .await?;
        for mut task in completed {
            task.status = TaskStatus::Archived;
            task.updated_at = next_timestamp(task.updated_at);
            self.store.update_task(task).await?;
            report.tasks_archived += 1;
        }

        for mut epic in self.store.list_epics().await? {
            if epic.status != EpicStatus::Completed {
                continue;
            }
            epic.status = EpicStatus::Archived;
            epic.updated_at = next_timestamp(epic.updated_at);
            self.store.update_epic(epic).await?;
            report.epics_archived += 1;
        }

        tracing::info!(
            tasks = report.tasks_archived,
            epics = report.epics_archived,
            "archived completed items"
        );
        Ok(report)
    }

    async fn require_task(&self, id: &str) -> Result<Task> {
        self.store
            .get_task(id)
            .await?
            .ok_or_else(|| Error::not_found("Task", id))
    }

    async fn require_epic(&self, id: &str) -> Result<Epic> {
        self.store
            .get_epic(id)
            .await?
            .ok_or_else(|| Error::not_found("Epic", id))
    }
}
