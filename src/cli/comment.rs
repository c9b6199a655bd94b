//! trek comment command implementations

use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::model::{Comment, NewComment};
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct CommentListOutput {
    total: usize,
    comments: Vec<Comment>,
}

#[derive(Serialize)]
struct CommentDeletedOutput<'a> {
    id: &'a str,
}

pub async fn run_add(ctx: &Context, task_id: &str, author: String, content: String) -> Result<()> {
    let comment = ctx
        .tracker
        .add_comment(task_id, NewComment { author, content })
        .await?;

    let mut human = HumanOutput::new("Comment added");
    human.push_summary("ID", comment.id.clone());
    human.push_summary("Task", comment.task_id.clone());
    human.push_summary("Author", comment.author.clone());
    emit_success(ctx.output, "comment add", &comment, Some(&human))
}

pub async fn run_list(ctx: &Context, task_id: &str) -> Result<()> {
    let comments = ctx.tracker.list_comments(task_id).await?;

    let mut human = HumanOutput::new(format!("Comments on {task_id}"));
    human.push_summary("Total", comments.len().to_string());
    for comment in &comments {
        human.push_detail(format!(
            "{} [{}] {}: {}",
            comment.id,
            comment.created_at.to_rfc3339(),
            comment.author,
            comment.content
        ));
    }

    let output = CommentListOutput {
        total: comments.len(),
        comments,
    };
    emit_success(ctx.output, "comment list", &output, Some(&human))
}

pub async fn run_delete(ctx: &Context, id: &str) -> Result<()> {
    ctx.tracker.delete_comment(id).await?;

    let human = HumanOutput::new(format!("Comment {id} deleted"));
    emit_success(
        ctx.output,
        "comment delete",
        &CommentDeletedOutput { id },
        Some(&human),
    )
}
