//! Mutation commands.
//!
//! Commands validate their input, build the new record and hand it to the
//! store fire-and-forget. Input errors return immediately; the store outcome
//! arrives later through the optional completion callback.

use chrono::NaiveDate;
use serde_json::json;
use ulid::Ulid;
use uuid::Uuid;

use crate::config::InviteConfig;
use crate::error::{Error, Result};
use crate::identity::{require_user, AuthProvider};
use crate::membership;
use crate::model::{Comment, Project, Task, TaskStatus};
use crate::notify::Notifier;
use crate::store::{Completion, RecordStore};
use crate::view::{COMMENTS_PATH, PROJECTS_PATH, TASKS_PATH};

/// Input for a new task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    /// Defaults to the signed-in user's email.
    pub assignee_email: Option<String>,
    pub due_date: Option<NaiveDate>,
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Comment keys sort by creation time, so store order is posting order.
pub fn new_comment_id() -> String {
    Ulid::new().to_string()
}

pub fn create_project(
    store: &dyn RecordStore,
    auth: &dyn AuthProvider,
    title: &str,
    description: &str,
    done: Option<Completion>,
) -> Result<Project> {
    let (user_id, user_email) = require_user(auth)?;
    let title = required("title", title)?;
    let description = required("description", description)?;

    let project = Project::new(new_id(), title, description, user_id, user_email);
    store.write(
        &format!("{PROJECTS_PATH}/{}", project.id),
        project.to_record(),
        done,
    );
    tracing::info!(project_id = %project.id, owner = %project.owner_id, "project created");
    Ok(project)
}

/// Append a member email to the project and send the invitation.
pub fn invite_member(
    store: &dyn RecordStore,
    notifier: &dyn Notifier,
    invite: &InviteConfig,
    project: &Project,
    email: &str,
    done: Option<Completion>,
) -> Result<Project> {
    let email = required("member email", email)?;
    validate_key("project id", &project.id)?;

    let updated = membership::add_member(project, email);
    store.write(
        &format!("{PROJECTS_PATH}/{}/memberEmails", project.id),
        json!(updated.member_emails),
        done,
    );
    notifier.send_invite(email, &invite.subject, &invite.body);
    tracing::info!(project_id = %project.id, email, "member invited");
    Ok(updated)
}

pub fn create_task(
    store: &dyn RecordStore,
    auth: &dyn AuthProvider,
    project_id: &str,
    input: NewTask,
    done: Option<Completion>,
) -> Result<Task> {
    let (_, user_email) = require_user(auth)?;
    validate_key("project id", project_id)?;
    let title = required("title", &input.title)?;
    let description = required("description", &input.description)?;
    let assignee = input
        .assignee_email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .unwrap_or(&user_email)
        .to_string();

    let task = Task::new(
        new_id(),
        project_id,
        title,
        description,
        assignee,
        input.due_date,
    );
    store.write(&format!("{TASKS_PATH}/{}", task.id), task.to_record(), done);
    tracing::info!(task_id = %task.id, project_id, "task created");
    Ok(task)
}

/// Move a task to any status; there is no enforced workflow order.
pub fn set_task_status(
    store: &dyn RecordStore,
    task_id: &str,
    status: TaskStatus,
    done: Option<Completion>,
) -> Result<()> {
    validate_key("task id", task_id)?;
    store.write(
        &format!("{TASKS_PATH}/{task_id}/status"),
        json!(status.as_str()),
        done,
    );
    tracing::info!(task_id, status = %status, "task status changed");
    Ok(())
}

/// Remove a task. Its comment thread is left in place.
pub fn delete_task(store: &dyn RecordStore, task_id: &str, done: Option<Completion>) -> Result<()> {
    validate_key("task id", task_id)?;
    store.remove(&format!("{TASKS_PATH}/{task_id}"), done);
    tracing::info!(task_id, "task deleted");
    Ok(())
}

pub fn post_comment(
    store: &dyn RecordStore,
    task_id: &str,
    text: &str,
    done: Option<Completion>,
) -> Result<Comment> {
    validate_key("task id", task_id)?;
    let text = crate::comments::validate_comment(text)?;
    let comment = Comment {
        id: new_comment_id(),
        text: text.to_string(),
    };
    store.write(
        &format!("{COMMENTS_PATH}/{task_id}/{}", comment.id),
        comment.to_record(),
        done,
    );
    tracing::info!(task_id, comment_id = %comment.id, "comment posted");
    Ok(comment)
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{field} cannot be empty")));
    }
    Ok(trimmed)
}

fn validate_key(field: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.contains('/') {
        return Err(Error::InvalidArgument(format!("invalid {field} '{value}'")));
    }
    crate::store::parse_path(value).map(|_| ())
}
