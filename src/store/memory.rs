//! In-memory entity store.
//!
//! Ephemeral; used by tests and as the reference adapter.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DependencyFilter, EntityStore, StoreDocument, TaskFilter};
use crate::error::Result;
use crate::model::{Comment, Dependency, Epic, Project, Task};

#[derive(Debug)]
pub struct MemoryStore {
    doc: RwLock<StoreDocument>,
}

impl MemoryStore {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            doc: RwLock::new(StoreDocument::new(project_name)),
        }
    }

    /// Copy of the current contents
    pub async fn document(&self) -> StoreDocument {
        self.doc.read().await.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("default")
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn project(&self) -> Result<Project> {
        Ok(self.doc.read().await.project.clone())
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.doc.read().await.get_task(id))
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        Ok(self.doc.read().await.list_tasks(filter))
    }

    async fn insert_task(&self, task: Task) -> Result<()> {
        self.doc.write().await.insert_task(task)
    }

    async fn update_task(&self, task: Task) -> Result<()> {
        self.doc.write().await.update_task(task)
    }

    async fn delete_task(&self, id: &str) -> Result<bool> {
        Ok(self.doc.write().await.delete_task(id))
    }

    async fn get_epic(&self, id: &str) -> Result<Option<Epic>> {
        Ok(self.doc.read().await.get_epic(id))
    }

    async fn list_epics(&self) -> Result<Vec<Epic>> {
        Ok(self.doc.read().await.epics.clone())
    }

    async fn insert_epic(&self, epic: Epic) -> Result<()> {
        self.doc.write().await.insert_epic(epic)
    }

    async fn update_epic(&self, epic: Epic) -> Result<()> {
        self.doc.write().await.update_epic(epic)
    }

    async fn delete_epic(&self, id: &str) -> Result<bool> {
        Ok(self.doc.write().await.delete_epic(id))
    }

    async fn find_dependency(
        &self,
        task_id: &str,
        depends_on_id: &str,
    ) -> Result<Option<Dependency>> {
        Ok(self.doc.read().await.find_dependency(task_id, depends_on_id))
    }

    async fn list_dependencies(&self, filter: &DependencyFilter) -> Result<Vec<Dependency>> {
        Ok(self.doc.read().await.list_dependencies(filter))
    }

    async fn insert_dependency(&self, dep: Dependency) -> Result<()> {
        self.doc.write().await.insert_dependency(dep)
    }

    async fn delete_dependency(&self, id: &str) -> Result<bool> {
        Ok(self.doc.write().await.delete_dependency(id))
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self.doc.read().await.get_comment(id))
    }

    async fn list_comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        Ok(self.doc.read().await.list_comments(task_id))
    }

    async fn insert_comment(&self, comment: Comment) -> Result<()> {
        self.doc.write().await.insert_comment(comment)
    }

    async fn delete_comment(&self, id: &str) -> Result<bool> {
        Ok(self.doc.write().await.delete_comment(id))
    }
}
