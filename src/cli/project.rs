//! taskboard project command implementations.

use serde::Serialize;

use crate::cli::{display_path, BoardContext, GlobalOptions, WriteTracker};
use crate::commands;
use crate::error::Result;
use crate::membership;
use crate::model::Project;
use crate::notify::{Invitation, MemoryOutbox, Notifier, OutboxDestination};
use crate::output::{emit_report, Report};
use crate::palette;
use crate::view;

pub struct NewOptions {
    pub title: String,
    pub description: String,
    pub global: GlobalOptions,
}

pub struct InviteOptions {
    pub project: String,
    pub email: String,
    pub global: GlobalOptions,
}

pub struct MembersOptions {
    pub project: String,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct ProjectSummary {
    #[serde(flatten)]
    project: Project,
    color: &'static str,
    owned: bool,
}

#[derive(Serialize)]
struct ProjectListOutput {
    total: usize,
    projects: Vec<ProjectSummary>,
}

#[derive(Serialize)]
struct ProjectCreateOutput {
    #[serde(flatten)]
    project: Project,
    color: &'static str,
    data_file: String,
}

#[derive(Serialize)]
struct InviteOutput {
    project_id: String,
    email: String,
    member_emails: Vec<String>,
    mailto: String,
    queued: bool,
}

#[derive(Serialize)]
struct MembersOutput {
    project_id: String,
    member_emails: Vec<String>,
    assignable: Vec<String>,
}

pub fn run_list(global: GlobalOptions) -> Result<()> {
    let ctx = BoardContext::load(&global, false)?;
    let live = view::projects_view(&ctx.store, &ctx.identity)?;
    let projects = live.try_current()?.unwrap_or_default();
    live.close();

    let user_id = ctx.user_id();
    let output = ProjectListOutput {
        total: projects.len(),
        projects: projects
            .into_iter()
            .map(|project| ProjectSummary {
                color: palette::card_color(&project.id),
                owned: !user_id.is_empty() && project.owner_id == user_id,
                project,
            })
            .collect(),
    };

    let mut report = Report::new("Projects");
    report.field("Total", output.total.to_string());
    for summary in &output.projects {
        let mut line = format!(
            "{} {} [{}]",
            summary.project.id, summary.project.title, summary.color
        );
        if summary.owned {
            line.push_str(" (owner)");
        }
        report.line(line);
    }
    if !ctx.identity.is_signed_in() {
        report.warn("not signed in; no projects are visible");
    } else if output.total == 0 {
        report.hint("taskboard project new <title> --description <text>");
    }
    emit_report(global.output(), "project list", &output, &report)
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = BoardContext::load(&options.global, true)?;
    let writes = WriteTracker::new();
    let project = commands::create_project(
        &ctx.store,
        &ctx.identity,
        &options.title,
        &options.description,
        writes.completion("projects"),
    )?;
    writes.finish()?;
    ctx.persist()?;

    let output = ProjectCreateOutput {
        color: palette::card_color(&project.id),
        data_file: display_path(&ctx.data_path),
        project,
    };
    let mut report = Report::new("Project created");
    report.field("ID", output.project.id.clone());
    report.field("Title", output.project.title.clone());
    report.field("Description", output.project.description.clone());
    report.field("Color", output.color);
    report.hint(format!(
        "taskboard project invite {} <email>",
        output.project.id
    ));
    emit_report(
        options.global.output(),
        "project new",
        &output,
        &report,
    )
}

pub fn run_invite(options: InviteOptions) -> Result<()> {
    let ctx = BoardContext::load(&options.global, true)?;
    let project = ctx.visible_project(&options.project)?;

    let destination = OutboxDestination::parse(
        options
            .global
            .outbox
            .as_deref()
            .or(ctx.config.invite.outbox.as_deref()),
    );
    let memory = MemoryOutbox::new();
    let queued_outbox = destination.as_ref().map(|dest| dest.open()).transpose()?;
    let notifier: &dyn Notifier = match &queued_outbox {
        Some(outbox) => outbox as &dyn Notifier,
        None => &memory as &dyn Notifier,
    };
    if queued_outbox.is_none() {
        tracing::debug!(
            email = %options.email.trim(),
            "no invite outbox configured, invitation not queued"
        );
    }

    let writes = WriteTracker::new();
    let updated = commands::invite_member(
        &ctx.store,
        notifier,
        &ctx.config.invite,
        &project,
        &options.email,
        writes.completion(format!("projects/{}/memberEmails", project.id)),
    )?;
    writes.finish()?;
    ctx.persist()?;

    let email = options.email.trim().to_string();
    let invitation = Invitation::new(&email, &ctx.config.invite.subject, &ctx.config.invite.body);
    let output = InviteOutput {
        project_id: updated.id.clone(),
        email: email.clone(),
        member_emails: updated.member_emails.clone(),
        mailto: invitation.mailto(),
        queued: queued_outbox.is_some(),
    };

    let mut report = Report::new("Member invited");
    report.field("Project", updated.id.clone());
    report.field("Email", email.clone());
    report.field("Members", updated.member_emails.len().to_string());
    if project.member_emails.iter().any(|existing| existing == &email) {
        report.warn(format!("{email} was already a member; listed twice now"));
    }
    if output.queued {
        report.line("invitation queued in outbox");
    } else {
        report.line(format!("send invitation: {}", output.mailto));
    }
    emit_report(
        options.global.output(),
        "project invite",
        &output,
        &report,
    )
}

pub fn run_members(options: MembersOptions) -> Result<()> {
    let ctx = BoardContext::load(&options.global, false)?;
    let project = ctx.visible_project(&options.project)?;
    let live = view::members_view(&ctx.store, &project.id)?;
    let member_emails = live.try_current()?.unwrap_or_default();
    live.close();

    let output = MembersOutput {
        project_id: project.id.clone(),
        assignable: membership::assignable_members(&Project {
            member_emails: member_emails.clone(),
            ..project
        }),
        member_emails,
    };
    let mut report = Report::new(format!("Members of {}", output.project_id));
    report.field("Total", output.member_emails.len().to_string());
    for email in &output.assignable {
        report.line(email.clone());
    }
    emit_report(
        options.global.output(),
        "project members",
        &output,
        &report,
    )
}
