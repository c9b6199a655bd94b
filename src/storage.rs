//! On-disk layout for a trek root
//!
//! ```text
//! <root>/
//!   .trek.toml                  # Optional configuration
//!   .trek/
//!     store.json                # Project, tasks, epics, dependencies, comments
//!     store.json.lock           # Advisory lock guarding store.json
//! ```

use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE;

/// Name of the data directory under the root
pub const DATA_DIR: &str = ".trek";

/// Name of the store document
pub const STORE_FILE: &str = "store.json";

/// Path resolver for a trek root
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve the root from an explicit path or the current directory
    pub fn discover(root: Option<PathBuf>) -> Self {
        let root = root.unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        });
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the `.trek/` directory
    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    /// Path to the store document
    pub fn store_file(&self) -> PathBuf {
        self.data_dir().join(STORE_FILE)
    }

    /// Path to `.trek.toml`
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn ensure_dirs(&self) -> crate::error::Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted() {
        let storage = Storage::new(PathBuf::from("/work"));
        assert_eq!(storage.data_dir(), PathBuf::from("/work/.trek"));
        assert_eq!(storage.store_file(), PathBuf::from("/work/.trek/store.json"));
        assert_eq!(storage.config_file(), PathBuf::from("/work/.trek.toml"));
    }

    #[test]
    fn ensure_dirs_creates_data_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Storage::new(dir.path().to_path_buf());
        assert!(!storage.data_dir().exists());
        storage.ensure_dirs().expect("dirs");
        assert!(storage.data_dir().is_dir());
    }
}
