//! File-backed entity store.
//!
//! The whole store lives in one JSON document. Every row operation takes
//! the advisory lock, reads the document, applies the change and replaces
//! the file atomically, so each single-row operation is atomic across
//! processes. Blocking IO runs on tokio's blocking pool.

use std::path::PathBuf;

use async_trait::async_trait;

use super::{DependencyFilter, EntityStore, StoreDocument, TaskFilter};
use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::{Comment, Dependency, Epic, Project, Task};
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    timeout_ms: u64,
}

impl FileStore {
    /// Open the store under `storage`, creating an empty one (with its
    /// project record) if none exists yet.
    pub fn open(storage: &Storage) -> Result<Self> {
        storage.ensure_dirs()?;
        let path = storage.store_file();
        let store = Self {
            lock_path: lock::lock_path_for(&path),
            path,
            timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        };

        let _lock = FileLock::acquire(&store.lock_path, store.timeout_ms)?;
        if !store.path.exists() {
            let name = storage
                .root()
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "default".to_string());
            let doc = StoreDocument::new(name);
            write_document(&store.path, &doc)?;
            tracing::info!(path = %store.path.display(), project = %doc.project.id, "created store");
        }
        Ok(store)
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&StoreDocument) -> T + Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        let timeout_ms = self.timeout_ms;
        run_blocking(move || {
            let _lock = FileLock::acquire(&lock_path, timeout_ms)?;
            let doc = read_document(&path)?;
            Ok(op(&doc))
        })
        .await
    }

    async fn write<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreDocument) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        let timeout_ms = self.timeout_ms;
        run_blocking(move || {
            let _lock = FileLock::acquire(&lock_path, timeout_ms)?;
            let mut doc = read_document(&path)?;
            let out = op(&mut doc)?;
            write_document(&path, &doc)?;
            Ok(out)
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| Error::Store(format!("store worker failed: {err}")))?
}

fn read_document(path: &std::path::Path) -> Result<StoreDocument> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_document(path: &std::path::Path, doc: &StoreDocument) -> Result<()> {
    let data = serde_json::to_vec_pretty(doc)?;
    lock::write_atomic(path, &data)
}

#[async_trait]
impl EntityStore for FileStore {
    async fn project(&self) -> Result<Project> {
        self.read(|doc| doc.project.clone()).await
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let id = id.to_string();
        self.read(move |doc| doc.get_task(&id)).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let filter = filter.clone();
        self.read(move |doc| doc.list_tasks(&filter)).await
    }

    async fn insert_task(&self, task: Task) -> Result<()> {
        self.write(move |doc| doc.insert_task(task)).await
    }

    async fn update_task(&self, task: Task) -> Result<()> {
        self.write(move |doc| doc.update_task(task)).await
    }

    async fn delete_task(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.write(move |doc| Ok(doc.delete_task(&id))).await
    }

    async fn get_epic(&self, id: &str) -> Result<Option<Epic>> {
        let id = id.to_string();
        self.read(move |doc| doc.get_epic(&id)).await
    }

    async fn list_epics(&self) -> Result<Vec<Epic>> {
        self.read(|doc| doc.epics.clone()).await
    }

    async fn insert_epic(&self, epic: Epic) -> Result<()> {
        self.write(move |doc| doc.insert_epic(epic)).await
    }

    async fn update_epic(&self, epic: Epic) -> Result<()> {
        self.write(move |doc| doc.update_epic(epic)).await
    }

    async fn delete_epic(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.write(move |doc| Ok(doc.delete_epic(&id))).await
    }

    async fn find_dependency(
        &self,
        task_id: &str,
        depends_on_id: &str,
    ) -> Result<Option<Dependency>> {
        let task_id = task_id.to_string();
        let depends_on_id = depends_on_id.to_string();
        self.read(move |doc| doc.find_dependency(&task_id, &depends_on_id))
            .await
    }

    async fn list_dependencies(&self, filter: &DependencyFilter) -> Result<Vec<Dependency>> {
        let filter = filter.clone();
        self.read(move |doc| doc.list_dependencies(&filter)).await
    }

    async fn insert_dependency(&self, dep: Dependency) -> Result<()> {
        self.write(move |doc| doc.insert_dependency(dep)).await
    }

    async fn delete_dependency(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.write(move |doc| Ok(doc.delete_dependency(&id))).await
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        let id = id.to_string();
        self.read(move |doc| doc.get_comment(&id)).await
    }

    async fn list_comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        let task_id = task_id.to_string();
        self.read(move |doc| doc.list_comments(&task_id)).await
    }

    async fn insert_comment(&self, comment: Comment) -> Result<()> {
        self.write(move |doc| doc.insert_comment(comment)).await
    }

    async fn delete_comment(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.write(move |doc| Ok(doc.delete_comment(&id))).await
    }
}
