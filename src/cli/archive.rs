//! trek archive command implementation

use super::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

pub async fn run(ctx: &Context) -> Result<()> {
    let report = ctx.tracker.archive_completed().await?;

    let mut human = HumanOutput::new("Archived completed items");
    human.push_summary("Tasks", report.tasks_archived.to_string());
    human.push_summary("Epics", report.epics_archived.to_string());
    emit_success(ctx.output, "archive", &report, Some(&human))
}
