//! taskboard task command implementations.

use serde::Serialize;

use crate::board::Board;
use crate::cli::{BoardContext, GlobalOptions, WriteTracker};
use crate::commands::{self, NewTask};
use crate::error::{Error, Result};
use crate::membership;
use crate::model::{parse_due_date, Task, TaskStatus, DUE_DATE_FORMAT};
use crate::output::{emit_report, Report};
use crate::palette;
use crate::view;

pub struct BoardOptions {
    pub project: String,
    pub global: GlobalOptions,
}

pub struct NewOptions {
    pub project: String,
    pub title: String,
    pub description: String,
    pub assignee: Option<String>,
    pub due: Option<String>,
    pub global: GlobalOptions,
}

pub struct StatusOptions {
    pub id: String,
    pub status: String,
    pub global: GlobalOptions,
}

pub struct DeleteOptions {
    pub id: String,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct BoardOutput {
    title: String,
    color: &'static str,
    total: usize,
    #[serde(flatten)]
    board: Board,
}

#[derive(Serialize)]
struct TaskChangeOutput {
    id: String,
    project_id: String,
    status: String,
}

pub fn run_board(options: BoardOptions) -> Result<()> {
    let ctx = BoardContext::load(&options.global, false)?;
    let project = ctx.visible_project(&options.project)?;
    let live = view::board_view(&ctx.store, &project.id)?;
    let board = live
        .try_current()?
        .ok_or_else(|| Error::OperationFailed("board view produced no snapshot".to_string()))?;
    live.close();

    let output = BoardOutput {
        title: project.title.clone(),
        color: palette::card_color(&project.id),
        total: board.len(),
        board,
    };

    let mut report = Report::new(format!("{} [{}]", output.title, output.color));
    for status in TaskStatus::ALL {
        let column = output.board.column(status);
        report.field(status.as_str(), column.len().to_string());
        for task in column {
            report.line(format_task_line(status, task));
        }
    }
    if output.board.is_empty() {
        report.hint(format!(
            "taskboard task new {} <title> --description <text>",
            output.board.project_id
        ));
    }
    emit_report(
        options.global.output(),
        "task board",
        &output,
        &report,
    )
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = BoardContext::load(&options.global, true)?;
    let project = ctx.visible_project(&options.project)?;
    let due_date = match options.due.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_due_date(raw).ok_or_else(|| {
            Error::InvalidArgument(format!("due date '{raw}' must be YYYY-MM-DD"))
        })?),
    };

    let writes = WriteTracker::new();
    let task = commands::create_task(
        &ctx.store,
        &ctx.identity,
        &project.id,
        NewTask {
            title: options.title,
            description: options.description,
            assignee_email: options.assignee,
            due_date,
        },
        writes.completion("tasks"),
    )?;
    writes.finish()?;
    ctx.persist()?;

    let mut report = Report::new("Task created");
    report.field("ID", task.id.clone());
    report.field("Project", task.project_id.clone());
    report.field("Title", task.title.clone());
    report.field("Status", task.status.clone());
    report.field("Assignee", task.assignee_email.clone());
    if let Some(due) = task.due_date {
        report.field("Due", due.format(DUE_DATE_FORMAT).to_string());
    }
    if !membership::assignable_members(&project).contains(&task.assignee_email) {
        report.warn(format!(
            "{} is not a member of {}",
            task.assignee_email, project.id
        ));
    }
    emit_report(options.global.output(), "task new", &task, &report)
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let status: TaskStatus = options.status.parse()?;
    let ctx = BoardContext::load(&options.global, true)?;
    let (task, _) = ctx.visible_task(&options.id)?;

    let writes = WriteTracker::new();
    commands::set_task_status(
        &ctx.store,
        &task.id,
        status,
        writes.completion(format!("tasks/{}/status", task.id)),
    )?;
    writes.finish()?;
    ctx.persist()?;

    let output = TaskChangeOutput {
        id: task.id.clone(),
        project_id: task.project_id.clone(),
        status: status.as_str().to_string(),
    };
    let mut report = Report::new("Task status updated");
    report.field("ID", output.id.clone());
    report.field("From", task.status.clone());
    report.field("To", output.status.clone());
    emit_report(
        options.global.output(),
        "task status",
        &output,
        &report,
    )
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let ctx = BoardContext::load(&options.global, true)?;
    let (task, _) = ctx.visible_task(&options.id)?;

    let writes = WriteTracker::new();
    commands::delete_task(
        &ctx.store,
        &task.id,
        writes.completion(format!("tasks/{}", task.id)),
    )?;
    writes.finish()?;
    ctx.persist()?;

    let output = TaskChangeOutput {
        id: task.id.clone(),
        project_id: task.project_id.clone(),
        status: "deleted".to_string(),
    };
    let mut report = Report::new("Task deleted");
    report.field("ID", output.id.clone());
    report.field("Title", task.title.clone());
    emit_report(
        options.global.output(),
        "task delete",
        &output,
        &report,
    )
}

fn format_task_line(status: TaskStatus, task: &Task) -> String {
    let mut line = format!("[{}] {} {}", status.as_str(), task.id, task.title);
    if !task.assignee_email.is_empty() {
        line.push_str(&format!(" @{}", task.assignee_email));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due.format(DUE_DATE_FORMAT)));
    }
    line
}
