//! trek task command implementations

use serde::Serialize;

use super::Context;
use crate::cascade::CascadeReport;
use crate::error::Result;
use crate::model::{Comment, NewTask, TaskStatus, TaskUpdate};
use crate::output::{emit_success, HumanOutput};
use crate::store::TaskFilter;
use crate::tracker::TaskView;

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<u8>,
    pub epic: Option<String>,
    pub parent: Option<String>,
    pub tags: Vec<String>,
}

pub struct ListOptions {
    pub status: Option<String>,
    pub epic: Option<String>,
    pub parent: Option<String>,
    pub blocked: bool,
}

pub struct UpdateOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<u8>,
    pub epic: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<TaskView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskDetailsOutput {
    #[serde(flatten)]
    task: TaskView,
    subtasks: Vec<String>,
    comments: Vec<Comment>,
}

pub async fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let status = parse_status(options.status.as_deref())?;
    let view = ctx
        .tracker
        .create_task(NewTask {
            title: options.title,
            description: options.description,
            status,
            priority: options.priority,
            epic_id: options.epic,
            parent_task_id: options.parent,
            tags: options.tags,
        })
        .await?;

    let mut human = HumanOutput::new("Task created");
    push_task_summary(&mut human, &view);

    emit_success(ctx.output, "task add", &view, Some(&human))
}

pub async fn run_list(ctx: &Context, options: ListOptions) -> Result<()> {
    let filter = TaskFilter {
        status: parse_status(options.status.as_deref())?,
        epic_id: options.epic,
        parent_task_id: options.parent,
    };
    let mut tasks = ctx.tracker.list_tasks(&filter).await?;
    let blocked = ctx.tracker.graph().blocked_task_ids().await?;
    if options.blocked {
        tasks.retain(|view| blocked.contains(&view.task.id));
    }

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", tasks.len().to_string());
    for view in &tasks {
        let task = &view.task;
        let mut line = format!(
            "[{}][P{}] {} {}",
            task.status, task.priority, task.id, task.title
        );
        if let Some(epic) = task.epic_id.as_ref() {
            line.push_str(&format!(" (epic: {epic})"));
        }
        if let Some(parent) = task.parent_task_id.as_ref() {
            line.push_str(&format!(" (parent: {parent})"));
        }
        if blocked.contains(&task.id) {
            line.push_str(" (blocked)");
        }
        human.push_detail(line);
    }

    let output = TaskListOutput {
        total: tasks.len(),
        tasks,
    };
    emit_success(ctx.output, "task list", &output, Some(&human))
}

pub async fn run_show(ctx: &Context, id: &str) -> Result<()> {
    let view = ctx.tracker.get_task(id).await?;
    let subtasks: Vec<String> = ctx
        .tracker
        .subtasks(id)
        .await?
        .into_iter()
        .map(|child| child.task.id)
        .collect();
    let comments = ctx.tracker.list_comments(id).await?;

    let mut human = HumanOutput::new(format!("Task {}", view.task.id));
    push_task_summary(&mut human, &view);
    if !subtasks.is_empty() {
        human.push_summary("Subtasks", subtasks.join(", "));
    }
    for comment in &comments {
        human.push_detail(format!(
            "[{}] {}: {}",
            comment.created_at.to_rfc3339(),
            comment.author,
            comment.content
        ));
    }

    let output = TaskDetailsOutput {
        task: view,
        subtasks,
        comments,
    };
    emit_success(ctx.output, "task show", &output, Some(&human))
}

pub async fn run_update(ctx: &Context, options: UpdateOptions) -> Result<()> {
    let update = TaskUpdate {
        title: options.title,
        description: options.description,
        status: parse_status(options.status.as_deref())?,
        priority: options.priority,
        epic_id: options.epic,
        tags: options.tags,
    };
    let view = ctx.tracker.update_task(&options.id, update).await?;

    let mut human = HumanOutput::new("Task updated");
    push_task_summary(&mut human, &view);

    emit_success(ctx.output, "task update", &view, Some(&human))
}

pub async fn run_delete(ctx: &Context, id: &str) -> Result<()> {
    let report: CascadeReport = ctx.tracker.delete_task(id).await?;

    let mut human = HumanOutput::new(format!("Task {id} deleted"));
    human.push_summary("Tasks removed", report.deleted_tasks.len().to_string());
    human.push_summary("Comments removed", report.deleted_comments.to_string());
    human.push_summary(
        "Dependencies removed",
        report.deleted_dependencies.to_string(),
    );
    for task_id in &report.deleted_tasks {
        human.push_detail(task_id.clone());
    }

    emit_success(ctx.output, "task delete", &report, Some(&human))
}

fn parse_status(raw: Option<&str>) -> Result<Option<TaskStatus>> {
    raw.map(str::parse::<TaskStatus>).transpose()
}

fn push_task_summary(human: &mut HumanOutput, view: &TaskView) {
    let task = &view.task;
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    if let Some(epic) = task.epic_id.as_ref() {
        human.push_summary("Epic", epic.clone());
    }
    if let Some(parent) = task.parent_task_id.as_ref() {
        human.push_summary("Parent", parent.clone());
    }
    if !task.tags.is_empty() {
        human.push_summary("Tags", task.tags.join(", "));
    }
    if !view.depends_on.is_empty() {
        human.push_summary("Depends on", view.depends_on.join(", "));
    }
    if !view.blocks.is_empty() {
        human.push_summary("Blocks", view.blocks.join(", "));
    }
}
