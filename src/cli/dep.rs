//! trek dep command implementations

use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DependencyRemovedOutput<'a> {
    task_id: &'a str,
    depends_on_id: &'a str,
}

pub async fn run_add(ctx: &Context, task_id: &str, depends_on_id: &str) -> Result<()> {
    let dependency = ctx.tracker.add_dependency(task_id, depends_on_id).await?;

    let mut human = HumanOutput::new("Dependency added");
    human.push_summary("ID", dependency.id.clone());
    human.push_summary("Task", task_id);
    human.push_summary("Depends on", depends_on_id);
    emit_success(ctx.output, "dep add", &dependency, Some(&human))
}

pub async fn run_rm(ctx: &Context, task_id: &str, depends_on_id: &str) -> Result<()> {
    ctx.tracker.remove_dependency(task_id, depends_on_id).await?;

    let human = HumanOutput::new(format!("Dependency {task_id} -> {depends_on_id} removed"));
    emit_success(
        ctx.output,
        "dep rm",
        &DependencyRemovedOutput {
            task_id,
            depends_on_id,
        },
        Some(&human),
    )
}
