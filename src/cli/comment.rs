//! taskboard comment command implementations.

use serde::Serialize;

use crate::cli::{BoardContext, GlobalOptions, WriteTracker};
use crate::commands;
use crate::error::Result;
use crate::output::{emit_report, Report};
use crate::view;

pub struct ListOptions {
    pub task: String,
    pub global: GlobalOptions,
}

pub struct PostOptions {
    pub task: String,
    pub text: String,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct CommentListOutput {
    task_id: String,
    total: usize,
    comments: Vec<String>,
}

#[derive(Serialize)]
struct CommentPostOutput {
    task_id: String,
    comment_id: String,
    text: String,
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = BoardContext::load(&options.global, false)?;
    let (task, _) = ctx.visible_task(&options.task)?;
    let live = view::comments_view(&ctx.store, &task.id)?;
    let comments = live.try_current()?.unwrap_or_default();
    live.close();

    let output = CommentListOutput {
        task_id: task.id.clone(),
        total: comments.len(),
        comments,
    };
    let mut report = Report::new(format!("Comments on {}", task.title));
    report.field("Total", output.total.to_string());
    for text in &output.comments {
        report.line(text.clone());
    }
    if output.comments.is_empty() {
        report.hint(format!("taskboard comment post {} <text>", task.id));
    }
    emit_report(
        options.global.output(),
        "comment list",
        &output,
        &report,
    )
}

pub fn run_post(options: PostOptions) -> Result<()> {
    let ctx = BoardContext::load(&options.global, true)?;
    let (task, _) = ctx.visible_task(&options.task)?;

    let writes = WriteTracker::new();
    let comment = commands::post_comment(
        &ctx.store,
        &task.id,
        &options.text,
        writes.completion(format!("comments/{}", task.id)),
    )?;
    writes.finish()?;
    ctx.persist()?;

    let output = CommentPostOutput {
        task_id: task.id.clone(),
        comment_id: comment.id,
        text: comment.text,
    };
    let mut report = Report::new("Comment posted");
    report.field("Task", output.task_id.clone());
    report.field("ID", output.comment_id.clone());
    emit_report(
        options.global.output(),
        "comment post",
        &output,
        &report,
    )
}
