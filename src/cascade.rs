//! Cascade deletion engine
//!
//! Deleting a task removes, for the task and each of its descendants:
//! 1. its comments
//! 2. every dependency edge where it is either endpoint
//! 3. its subtasks (depth-first, same steps)
//! 4. its own row
//!
//! The subtree walk uses an explicit stack of enter/exit steps instead of
//! recursion, which reproduces the recursive order exactly: children are
//! visited in store order and a row is deleted only after its whole subtree.
//! Rows already gone when the cascade reaches them are skipped.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::{DependencyFilter, EntityStore, TaskFilter};

/// What a cascade removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    /// Task ids in deletion order; the root is last
    pub deleted_tasks: Vec<String>,
    pub deleted_comments: usize,
    pub deleted_dependencies: usize,
}

enum Step {
    Enter(String),
    Exit(String),
}

#[derive(Clone)]
pub struct CascadeDeleter {
    store: Arc<dyn EntityStore>,
}

impl CascadeDeleter {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Delete a task with its comments, edges and subtask tree.
    pub async fn delete_task(&self, task_id: &str) -> Result<CascadeReport> {
        if self.store.get_task(task_id).await?.is_none() {
            return Err(Error::not_found("Task", task_id));
        }

        let mut report = CascadeReport::default();
        let mut entered: HashSet<String> = HashSet::new();
        let mut stack = vec![Step::Enter(task_id.to_string())];

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) => {
                    if !entered.insert(id.clone()) {
                        continue;
                    }
                    report.deleted_comments += self.delete_comments(&id).await?;
                    report.deleted_dependencies += self.delete_edges(&id).await?;

                    let children = self.store.list_tasks(&TaskFilter::children_of(&id)).await?;
                    stack.push(Step::Exit(id));
                    for child in children.into_iter().rev() {
                        stack.push(Step::Enter(child.id));
                    }
                }
                Step::Exit(id) => {
                    if self.store.delete_task(&id).await? {
                        report.deleted_tasks.push(id);
                    }
                }
            }
        }

        tracing::info!(
            task_id,
            tasks = report.deleted_tasks.len(),
            comments = report.deleted_comments,
            dependencies = report.deleted_dependencies,
            "task deleted"
        );
        Ok(report)
    }

    /// Delete an epic row only; its tasks keep a dangling `epic_id`.
    ///
    /// Returns how many tasks were left referencing the epic.
    pub async fn delete_epic(&self, epic_id: &str) -> Result<usize> {
        if self.store.get_epic(epic_id).await?.is_none() {
            return Err(Error::not_found("Epic", epic_id));
        }

        let orphaned = self
            .store
            .list_tasks(&TaskFilter {
                epic_id: Some(epic_id.to_string()),
                ..TaskFilter::default()
            })
            .await?
            .len();
        self.store.delete_epic(epic_id).await?;
        tracing::info!(epic_id, orphaned, "epic deleted");
        Ok(orphaned)
    }

    async fn delete_comments(&self, task_id: &str) -> Result<usize> {
        let mut deleted = 0;
        for comment in self.store.list_comments(task_id).await? {
            if self.store.delete_comment(&comment.id).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn delete_edges(&self, task_id: &str) -> Result<usize> {
        let mut edges = self
            .store
            .list_dependencies(&DependencyFilter::from_task(task_id))
            .await?;
        edges.extend(
            self.store
                .list_dependencies(&DependencyFilter::onto_task(task_id))
                .await?,
        );

        let mut deleted = 0;
        for edge in edges {
            if self.store.delete_dependency(&edge.id).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comment, Dependency, Task, TaskStatus};
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn task(id: &str, parent: Option<&str>) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            project_id: "p".to_string(),
            epic_id: None,
            parent_task_id: parent.map(str::to_string),
            title: id.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: 2,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn subtree_rows_are_deleted_children_first() {
        let store = Arc::new(MemoryStore::new("cascade"));
        for (id, parent) in [
            ("root", None),
            ("a", Some("root")),
            ("a1", Some("a")),
            ("b", Some("root")),
        ] {
            store.insert_task(task(id, parent)).await.unwrap();
        }

        let report = CascadeDeleter::new(store.clone())
            .delete_task("root")
            .await
            .unwrap();
        assert_eq!(report.deleted_tasks, vec!["a1", "a", "b", "root"]);
        assert!(store.document().await.tasks.is_empty());
    }

    #[tokio::test]
    async fn edges_in_both_directions_are_removed() {
        let store = Arc::new(MemoryStore::new("cascade"));
        for id in ["x", "y", "z"] {
            store.insert_task(task(id, None)).await.unwrap();
        }
        let now = Utc::now();
        for (id, from, to) in [("e1", "x", "y"), ("e2", "z", "x"), ("e3", "z", "y")] {
            store
                .insert_dependency(Dependency {
                    id: id.to_string(),
                    task_id: from.to_string(),
                    depends_on_id: to.to_string(),
                    created_at: now,
                })
                .await
                .unwrap();
        }
        store
            .insert_comment(Comment {
                id: "c1".to_string(),
                task_id: "x".to_string(),
                author: "ana".to_string(),
                content: "hi".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let report = CascadeDeleter::new(store.clone())
            .delete_task("x")
            .await
            .unwrap();
        assert_eq!(report.deleted_dependencies, 2);
        assert_eq!(report.deleted_comments, 1);

        let doc = store.document().await;
        assert_eq!(doc.dependencies.len(), 1);
        assert_eq!(doc.dependencies[0].id, "e3");
        assert!(doc.comments.is_empty());
    }

    #[tokio::test]
    async fn missing_epic_is_not_found() {
        let store = Arc::new(MemoryStore::new("cascade"));
        let err = CascadeDeleter::new(store).delete_epic("EPIC-none").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Epic", .. }));
    }
}
