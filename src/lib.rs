//! trek - task tracking core
//!
//! This library provides the engines behind the trek CLI: a dependency
//! graph that stays acyclic, cascade deletion of task subtrees, and a
//! snapshot-diffing change notifier with a streaming publisher.
//!
//! # Core Concepts
//!
//! - **Tasks and epics**: work items; tasks nest through `parent_task_id`
//! - **Dependencies**: directed edges `task -> prerequisite`, never cyclic
//! - **Cascade deletion**: deleting a task removes its comments, edges and subtasks
//! - **Change events**: `*_created` / `*_updated` / `*_deleted` computed by polling
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.trek.toml`
//! - `error`: Error types and result aliases
//! - `model`: Entities, statuses and input records
//! - `store`: Entity store trait with in-memory and file-backed implementations
//! - `graph`: Dependency graph engine
//! - `cascade`: Cascade deletion engine
//! - `changes`: Change notification engine
//! - `events`: Event stream publisher and JSONL sinks
//! - `tracker`: CRUD service tying the engines together
//! - `storage`: File storage and directory management
//! - `lock`: File locking and atomic writes

pub mod cascade;
pub mod changes;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod ids;
pub mod lock;
pub mod model;
pub mod output;
pub mod storage;
pub mod store;
pub mod tracker;

pub use cascade::{CascadeDeleter, CascadeReport};
pub use changes::{ChangeEvent, ChangeNotifier};
pub use config::Config;
pub use error::{Error, Result};
pub use events::{Publisher, StreamMessage};
pub use graph::DependencyGraph;
pub use store::{EntityStore, FileStore, MemoryStore};
pub use tracker::{ArchiveReport, TaskView, Tracker};
