//! Command-line interface for trek
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::storage::Storage;
use crate::store::FileStore;
use crate::tracker::Tracker;

mod archive;
mod comment;
mod dep;
mod epic;
mod task;
mod watch;

/// trek - task tracking with dependencies and change streams
#[derive(Parser, Debug)]
#[command(name = "trek")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the `.trek/` store (defaults to current directory)
    #[arg(long, global = true, env = "TREK_ROOT")]
    pub root: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Epic management
    #[command(subcommand)]
    Epic(EpicCommands),

    /// Task dependencies
    #[command(subcommand)]
    Dep(DepCommands),

    /// Task comments
    #[command(subcommand)]
    Comment(CommentCommands),

    /// Archive every completed task and epic
    Archive,

    /// Stream change events as JSON lines until interrupted
    Watch {
        /// Poll interval in milliseconds (defaults to events.poll_interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Event destination: `-` for stdout or a file path
        #[arg(long, default_value = "-")]
        events: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    Add {
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// todo, in_progress, completed, wont_fix, archived
        #[arg(long)]
        status: Option<String>,

        /// 0 (highest) to 5
        #[arg(short, long)]
        priority: Option<u8>,

        /// Epic the task belongs to
        #[arg(long)]
        epic: Option<String>,

        /// Parent task for a subtask
        #[arg(long)]
        parent: Option<String>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List tasks
    List {
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        epic: Option<String>,

        /// Only direct subtasks of this task
        #[arg(long)]
        parent: Option<String>,

        /// Only tasks with an unresolved prerequisite
        #[arg(long)]
        blocked: bool,
    },

    /// Show one task with dependencies, subtasks and comments
    Show { id: String },

    /// Update task fields
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long, conflicts_with = "description")]
        clear_description: bool,

        #[arg(long)]
        status: Option<String>,

        #[arg(short, long)]
        priority: Option<u8>,

        #[arg(long)]
        epic: Option<String>,

        #[arg(long, conflicts_with = "epic")]
        clear_epic: bool,

        /// Replace tags (repeatable)
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
    },

    /// Delete a task with its comments, dependencies and subtasks
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    /// Create an epic
    Add {
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// todo, in_progress, completed, archived
        #[arg(long)]
        status: Option<String>,

        #[arg(short, long)]
        priority: Option<u8>,
    },

    /// List epics
    List,

    /// Show one epic and its tasks
    Show { id: String },

    /// Update epic fields
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long, conflicts_with = "description")]
        clear_description: bool,

        #[arg(long)]
        status: Option<String>,

        #[arg(short, long)]
        priority: Option<u8>,
    },

    /// Delete an epic; its tasks are kept
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum DepCommands {
    /// Make TASK depend on PREREQUISITE
    Add { task: String, prerequisite: String },

    /// Remove the dependency TASK -> PREREQUISITE
    Rm { task: String, prerequisite: String },
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Comment on a task
    Add {
        task: String,

        content: String,

        #[arg(long, env = "TREK_AUTHOR", default_value = "anonymous")]
        author: String,
    },

    /// List comments on a task, oldest first
    List { task: String },

    /// Delete a comment
    Delete { id: String },
}

impl Commands {
    /// `group action` name reported in output envelopes
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add { .. } => "task add",
                TaskCommands::List { .. } => "task list",
                TaskCommands::Show { .. } => "task show",
                TaskCommands::Update { .. } => "task update",
                TaskCommands::Delete { .. } => "task delete",
            },
            Commands::Epic(cmd) => match cmd {
                EpicCommands::Add { .. } => "epic add",
                EpicCommands::List => "epic list",
                EpicCommands::Show { .. } => "epic show",
                EpicCommands::Update { .. } => "epic update",
                EpicCommands::Delete { .. } => "epic delete",
            },
            Commands::Dep(cmd) => match cmd {
                DepCommands::Add { .. } => "dep add",
                DepCommands::Rm { .. } => "dep rm",
            },
            Commands::Comment(cmd) => match cmd {
                CommentCommands::Add { .. } => "comment add",
                CommentCommands::List { .. } => "comment list",
                CommentCommands::Delete { .. } => "comment delete",
            },
            Commands::Archive => "archive",
            Commands::Watch { .. } => "watch",
        }
    }
}

/// Opened store plus output settings shared by every command
pub(crate) struct Context {
    pub tracker: Tracker,
    pub output: OutputOptions,
}

impl Context {
    fn open(root: Option<PathBuf>, json: bool, quiet: bool) -> Result<Self> {
        let storage = Storage::discover(root);
        let config = Config::load_or_default(&storage.config_file());
        let store = FileStore::open(&storage)?;
        tracing::debug!(path = %store.path().display(), "opened store");

        Ok(Self {
            tracker: Tracker::new(Arc::new(store), config),
            output: OutputOptions { json, quiet },
        })
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let ctx = Context::open(self.root, self.json, self.quiet)?;

        match self.command {
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add {
                    title,
                    description,
                    status,
                    priority,
                    epic,
                    parent,
                    tags,
                } => {
                    task::run_add(
                        &ctx,
                        task::AddOptions {
                            title,
                            description,
                            status,
                            priority,
                            epic,
                            parent,
                            tags,
                        },
                    )
                    .await
                }
                TaskCommands::List {
                    status,
                    epic,
                    parent,
                    blocked,
                } => {
                    task::run_list(
                        &ctx,
                        task::ListOptions {
                            status,
                            epic,
                            parent,
                            blocked,
                        },
                    )
                    .await
                }
                TaskCommands::Show { id } => task::run_show(&ctx, &id).await,
                TaskCommands::Update {
                    id,
                    title,
                    description,
                    clear_description,
                    status,
                    priority,
                    epic,
                    clear_epic,
                    tags,
                } => {
                    task::run_update(
                        &ctx,
                        task::UpdateOptions {
                            id,
                            title,
                            description: clearable(description, clear_description),
                            status,
                            priority,
                            epic: clearable(epic, clear_epic),
                            tags,
                        },
                    )
                    .await
                }
                TaskCommands::Delete { id } => task::run_delete(&ctx, &id).await,
            },
            Commands::Epic(cmd) => match cmd {
                EpicCommands::Add {
                    title,
                    description,
                    status,
                    priority,
                } => {
                    epic::run_add(
                        &ctx,
                        epic::AddOptions {
                            title,
                            description,
                            status,
                            priority,
                        },
                    )
                    .await
                }
                EpicCommands::List => epic::run_list(&ctx).await,
                EpicCommands::Show { id } => epic::run_show(&ctx, &id).await,
                EpicCommands::Update {
                    id,
                    title,
                    description,
                    clear_description,
                    status,
                    priority,
                } => {
                    epic::run_update(
                        &ctx,
                        epic::UpdateOptions {
                            id,
                            title,
                            description: clearable(description, clear_description),
                            status,
                            priority,
                        },
                    )
                    .await
                }
                EpicCommands::Delete { id } => epic::run_delete(&ctx, &id).await,
            },
            Commands::Dep(cmd) => match cmd {
                DepCommands::Add { task, prerequisite } => {
                    dep::run_add(&ctx, &task, &prerequisite).await
                }
                DepCommands::Rm { task, prerequisite } => {
                    dep::run_rm(&ctx, &task, &prerequisite).await
                }
            },
            Commands::Comment(cmd) => match cmd {
                CommentCommands::Add {
                    task,
                    content,
                    author,
                } => comment::run_add(&ctx, &task, author, content).await,
                CommentCommands::List { task } => comment::run_list(&ctx, &task).await,
                CommentCommands::Delete { id } => comment::run_delete(&ctx, &id).await,
            },
            Commands::Archive => archive::run(&ctx).await,
            Commands::Watch {
                interval_ms,
                events,
            } => watch::run(&ctx, interval_ms, &events).await,
        }
    }
}

/// `--x value` sets, `--clear-x` clears, neither leaves the field alone.
fn clearable(value: Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn clearable_flags() {
        assert_eq!(clearable(None, false), None);
        assert_eq!(clearable(None, true), Some(None));
        assert_eq!(clearable(Some("x".into()), false), Some(Some("x".into())));
    }

    #[test]
    fn command_name_ignores_global_flag_values() {
        let cli = Cli::try_parse_from(["trek", "--root", "/tmp/work", "--json", "task", "show", "TREK-1"])
            .unwrap();
        assert_eq!(cli.command.name(), "task show");

        let cli = Cli::try_parse_from(["trek", "dep", "rm", "TREK-1", "TREK-2", "--root", "/srv"])
            .unwrap();
        assert_eq!(cli.command.name(), "dep rm");

        let cli = Cli::try_parse_from(["trek", "watch", "--events", "out.jsonl"]).unwrap();
        assert_eq!(cli.command.name(), "watch");
    }

    #[test]
    fn repeated_tags_collect() {
        let cli = Cli::try_parse_from(["trek", "task", "add", "Ship", "--tag", "a", "--tag", "b"])
            .unwrap();
        match cli.command {
            Commands::Task(TaskCommands::Add { tags, .. }) => assert_eq!(tags, vec!["a", "b"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
