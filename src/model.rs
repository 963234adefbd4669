//! Board entities and their store records.
//!
//! Records come from a schemaless realtime store, so decoding never fails:
//! missing or wrong-typed fields fall back to defaults (empty strings, `To Do`
//! status, no due date) and the rest of the snapshot is still decoded.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::store::Record;

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Workflow state of a task. Any state may move to any other.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Done];

    /// The value stored in the `status` field.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    /// Match a stored status value exactly. Anything else is unrecognized.
    pub fn from_stored(raw: &str) -> Option<Self> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse for user input: accepts the stored form and
/// `todo`/`to_do`/`in-progress`/`done` style spellings.
impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "todo" => Ok(TaskStatus::ToDo),
            "inprogress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(Error::InvalidArgument(format!(
                "unknown status '{value}' (expected todo|in-progress|done)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub member_ids: Vec<String>,
    pub member_emails: Vec<String>,
}

impl Project {
    /// A new project; the owner is seeded as its first member.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        owner_id: impl Into<String>,
        owner_email: impl Into<String>,
    ) -> Self {
        let owner_id = owner_id.into();
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            member_ids: vec![owner_id.clone()],
            member_emails: vec![owner_email.into()],
            owner_id,
        }
    }

    pub fn from_record(record: &Record) -> Self {
        let value = &record.value;
        Self {
            id: id_field(value, "projectId", &record.key),
            title: string_field(value, "title"),
            description: string_field(value, "description"),
            owner_id: string_field(value, "ownerId"),
            member_ids: string_list(value, "memberIds"),
            member_emails: string_list(value, "memberEmails"),
        }
    }

    pub fn to_record(&self) -> Value {
        json!({
            "projectId": self.id,
            "title": self.title,
            "description": self.description,
            "ownerId": self.owner_id,
            "memberIds": self.member_ids,
            "memberEmails": self.member_emails,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: String,
    /// Stored status value, kept verbatim so unrecognized values stay visible.
    pub status: String,
    pub assignee_email: String,
    pub due_date: Option<NaiveDate>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        assignee_email: impl Into<String>,
        due_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            title: title.into(),
            description: description.into(),
            status: TaskStatus::default().as_str().to_string(),
            assignee_email: assignee_email.into(),
            due_date,
        }
    }

    /// The recognized status, or `None` when the stored value is unknown.
    pub fn status(&self) -> Option<TaskStatus> {
        TaskStatus::from_stored(&self.status)
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status.as_str().to_string();
        self
    }

    pub fn from_record(record: &Record) -> Self {
        let value = &record.value;
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| TaskStatus::default().as_str().to_string());
        Self {
            id: id_field(value, "taskId", &record.key),
            project_id: string_field(value, "projectId"),
            title: string_field(value, "title"),
            description: string_field(value, "description"),
            status,
            assignee_email: string_field(value, "assigneeId"),
            due_date: parse_due_date(&string_field(value, "dueDate")),
        }
    }

    pub fn to_record(&self) -> Value {
        json!({
            "taskId": self.id,
            "projectId": self.project_id,
            "title": self.title,
            "description": self.description,
            "status": self.status,
            "assigneeId": self.assignee_email,
            "dueDate": self
                .due_date
                .map(|date| date.format(DUE_DATE_FORMAT).to_string())
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
}

impl Comment {
    /// Decode a comment entry; entries without string text are dropped.
    pub fn from_record(record: &Record) -> Option<Self> {
        let text = record.value.get("text").and_then(Value::as_str)?;
        Some(Self {
            id: record.key.clone(),
            text: text.to_string(),
        })
    }

    pub fn to_record(&self) -> Value {
        json!({ "text": self.text })
    }
}

/// Badge tally for one assignee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserBadgeCount {
    pub email: String,
    pub badge_count: usize,
}

/// Per-user task counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStatusCounts {
    pub to_do: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl TaskStatusCounts {
    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::ToDo => self.to_do,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Done => self.done,
        }
    }

    pub fn total(&self) -> usize {
        self.to_do + self.in_progress + self.done
    }
}

pub fn decode_projects(snapshot: &[Record]) -> Vec<Project> {
    snapshot.iter().map(Project::from_record).collect()
}

pub fn decode_tasks(snapshot: &[Record]) -> Vec<Task> {
    snapshot.iter().map(Task::from_record).collect()
}

/// Parse a `YYYY-MM-DD` due date. Empty input means no due date.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, DUE_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            tracing::debug!(due_date = raw, %err, "ignoring unparseable due date");
            None
        }
    }
}

fn string_field(value: &Value, name: &str) -> String {
    match value.get(name) {
        Some(Value::String(text)) => text.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => {
            tracing::debug!(field = name, value = %other, "non-string field, using default");
            String::new()
        }
    }
}

fn id_field(value: &Value, name: &str, key: &str) -> String {
    let id = string_field(value, name);
    if id.is_empty() {
        key.to_string()
    } else {
        id
    }
}

/// Lists may arrive as JSON arrays or as index-keyed objects.
fn string_list(value: &Value, name: &str) -> Vec<String> {
    let items: Vec<&Value> = match value.get(name) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by_key(|(key, _)| key.parse::<usize>().unwrap_or(usize::MAX));
            entries.into_iter().map(|(_, value)| value).collect()
        }
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}
