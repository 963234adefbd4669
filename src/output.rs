//! Command results as a JSON envelope (`--json`) or a plain-text report.
//!
//! Every command builds one [`Report`] and hands it to [`emit_report`] together
//! with the data it serializes for machines. Failures go through
//! [`emit_failure`], which adds recovery hints for the common mistakes.

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "taskboard.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Plain-text result of one command.
#[derive(Debug, Clone, Default)]
pub struct Report {
    title: String,
    fields: Vec<(String, String)>,
    lines: Vec<String>,
    warnings: Vec<String>,
    hints: Vec<String>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// A `label: value` row. An empty value prints the label alone.
    pub fn field(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.fields.push((label.into(), value.into()));
    }

    /// A free-form row printed below the fields, such as a task or a comment.
    pub fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.warnings.push(text.into());
    }

    /// A follow-up command to suggest.
    pub fn hint(&mut self, command: impl Into<String>) {
        self.hints.push(command.into());
    }

    pub fn render(&self) -> String {
        let mut out = self.title.clone();
        for (label, value) in &self.fields {
            if value.is_empty() {
                out.push_str(&format!("\n  {label}"));
            } else {
                out.push_str(&format!("\n  {label}: {value}"));
            }
        }
        if !self.lines.is_empty() {
            if !self.fields.is_empty() {
                out.push('\n');
            }
            for line in &self.lines {
                out.push_str(&format!("\n  {line}"));
            }
        }
        for warning in &self.warnings {
            out.push_str(&format!("\nwarning: {warning}"));
        }
        for hint in &self.hints {
            out.push_str(&format!("\nnext: {hint}"));
        }
        out
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Failure>,
    #[serde(skip_serializing_if = "no_items")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_items")]
    hints: &'a [String],
}

#[derive(Serialize)]
struct Failure {
    kind: &'static str,
    message: String,
    exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn no_items(items: &&[String]) -> bool {
    items.is_empty()
}

impl<T: Serialize> Envelope<'_, T> {
    fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

pub fn emit_report<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    report: &Report,
) -> Result<()> {
    if options.json {
        return Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            ok: true,
            data: Some(data),
            error: None,
            warnings: &report.warnings,
            hints: &report.hints,
        }
        .print();
    }
    if !options.quiet {
        println!("{}", report.render());
    }
    Ok(())
}

pub fn emit_failure(command: &str, err: &Error, json: bool) -> Result<()> {
    let hints = recovery_hints(err);
    if json {
        return Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command,
            ok: false,
            data: None,
            error: Some(Failure {
                kind: failure_kind(err),
                message: err.to_string(),
                exit_code: err.exit_code(),
                details: err.details(),
            }),
            warnings: &[],
            hints: &hints,
        }
        .print();
    }

    eprintln!("error: {err}");
    for hint in &hints {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

fn failure_kind(err: &Error) -> &'static str {
    match err {
        Error::NotSignedIn => "not_signed_in",
        Error::ProjectNotFound(_) | Error::TaskNotFound(_) => "not_found",
        Error::InvalidArgument(_) | Error::InvalidConfig(_) => "invalid_input",
        Error::Subscription(_) | Error::WriteFailed { .. } => "store_rejected",
        Error::LockFailed(_) => "busy",
        _ => "operation_failed",
    }
}

fn recovery_hints(err: &Error) -> Vec<String> {
    let hint = match err {
        Error::NotSignedIn => {
            "pass --user <id> --email <email> or set [identity] in .taskboard.toml"
        }
        Error::ProjectNotFound(_) => "taskboard project list",
        Error::TaskNotFound(_) => "taskboard task board <project-id>",
        Error::InvalidConfig(_) => "fix .taskboard.toml then retry",
        Error::LockFailed(_) => "retry once the other taskboard command finishes",
        _ => return Vec::new(),
    };
    vec![hint.to_string()]
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

/// Global flags that consume the following argument as their value.
const VALUE_FLAGS: &[&str] = &["--data", "--user", "--email", "--outbox"];

fn infer_command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    let mut words: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        let takes_subcommand =
            words.is_empty() && matches!(arg.as_str(), "project" | "task" | "comment");
        words.push(arg);
        if !takes_subcommand {
            break;
        }
    }

    if words.is_empty() {
        "taskboard".to_string()
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn command_name_skips_global_flag_values() {
        assert_eq!(
            infer_command_name(args(&["--user", "u1", "--email", "a@x", "task", "board", "p1"])),
            "task board"
        );
        assert_eq!(infer_command_name(args(&["--json", "leaderboard"])), "leaderboard");
        assert_eq!(infer_command_name(args(&["--data=x.json", "profile"])), "profile");
        assert_eq!(infer_command_name(args(&[])), "taskboard");
    }

    #[test]
    fn failures_map_to_kinds_and_hints() {
        assert_eq!(failure_kind(&Error::NotSignedIn), "not_signed_in");
        assert_eq!(
            failure_kind(&Error::TaskNotFound("t1".to_string())),
            "not_found"
        );
        assert_eq!(
            recovery_hints(&Error::ProjectNotFound("p1".to_string())),
            vec!["taskboard project list"]
        );
        assert!(recovery_hints(&Error::OperationFailed("x".to_string())).is_empty());
    }
}
