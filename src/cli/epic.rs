//! trek epic command implementations

use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::model::{Epic, EpicStatus, EpicUpdate, NewEpic};
use crate::output::{emit_success, HumanOutput};
use crate::store::TaskFilter;

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<u8>,
}

pub struct UpdateOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<u8>,
}

#[derive(Serialize)]
struct EpicListOutput {
    total: usize,
    epics: Vec<Epic>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EpicDetailsOutput {
    #[serde(flatten)]
    epic: Epic,
    task_ids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EpicDeletedOutput<'a> {
    id: &'a str,
    orphaned_tasks: usize,
}

pub async fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let epic = ctx
        .tracker
        .create_epic(NewEpic {
            title: options.title,
            description: options.description,
            status: parse_status(options.status.as_deref())?,
            priority: options.priority,
        })
        .await?;

    let mut human = HumanOutput::new("Epic created");
    push_epic_summary(&mut human, &epic);
    emit_success(ctx.output, "epic add", &epic, Some(&human))
}

pub async fn run_list(ctx: &Context) -> Result<()> {
    let epics = ctx.tracker.list_epics().await?;

    let mut human = HumanOutput::new("Epics");
    human.push_summary("Total", epics.len().to_string());
    for epic in &epics {
        human.push_detail(format!(
            "[{}][P{}] {} {}",
            epic.status, epic.priority, epic.id, epic.title
        ));
    }

    let output = EpicListOutput {
        total: epics.len(),
        epics,
    };
    emit_success(ctx.output, "epic list", &output, Some(&human))
}

pub async fn run_show(ctx: &Context, id: &str) -> Result<()> {
    let epic = ctx.tracker.get_epic(id).await?;
    let task_ids: Vec<String> = ctx
        .tracker
        .list_tasks(&TaskFilter {
            epic_id: Some(id.to_string()),
            ..TaskFilter::default()
        })
        .await?
        .into_iter()
        .map(|view| view.task.id)
        .collect();

    let mut human = HumanOutput::new(format!("Epic {}", epic.id));
    push_epic_summary(&mut human, &epic);
    for task_id in &task_ids {
        human.push_detail(task_id.clone());
    }

    let output = EpicDetailsOutput { epic, task_ids };
    emit_success(ctx.output, "epic show", &output, Some(&human))
}

pub async fn run_update(ctx: &Context, options: UpdateOptions) -> Result<()> {
    let epic = ctx
        .tracker
        .update_epic(
            &options.id,
            EpicUpdate {
                title: options.title,
                description: options.description,
                status: parse_status(options.status.as_deref())?,
                priority: options.priority,
            },
        )
        .await?;

    let mut human = HumanOutput::new("Epic updated");
    push_epic_summary(&mut human, &epic);
    emit_success(ctx.output, "epic update", &epic, Some(&human))
}

pub async fn run_delete(ctx: &Context, id: &str) -> Result<()> {
    let orphaned_tasks = ctx.tracker.delete_epic(id).await?;

    let mut human = HumanOutput::new(format!("Epic {id} deleted"));
    if orphaned_tasks > 0 {
        human.push_warning(format!(
            "{orphaned_tasks} task(s) still reference the deleted epic"
        ));
    }
    emit_success(
        ctx.output,
        "epic delete",
        &EpicDeletedOutput { id, orphaned_tasks },
        Some(&human),
    )
}

fn parse_status(raw: Option<&str>) -> Result<Option<EpicStatus>> {
    raw.map(str::parse::<EpicStatus>).transpose()
}

fn push_epic_summary(human: &mut HumanOutput, epic: &Epic) {
    human.push_summary("ID", epic.id.clone());
    human.push_summary("Title", epic.title.clone());
    human.push_summary("Status", epic.status.to_string());
    human.push_summary("Priority", epic.priority.to_string());
}
