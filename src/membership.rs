//! Project visibility and membership.

use std::collections::HashSet;

use crate::model::Project;

/// True when the user owns the project or is listed among its member emails.
/// Blank identities never match, so a signed-out caller is a member of nothing.
pub fn is_member(project: &Project, user_id: &str, user_email: &str) -> bool {
    let owns = !user_id.is_empty() && project.owner_id == user_id;
    let invited = !user_email.is_empty()
        && project
            .member_emails
            .iter()
            .any(|email| email == user_email);
    owns || invited
}

/// Projects the user may see, in input order.
pub fn visible_projects(projects: &[Project], user_id: &str, user_email: &str) -> Vec<Project> {
    projects
        .iter()
        .filter(|project| is_member(project, user_id, user_email))
        .cloned()
        .collect()
}

/// Append a member email, returning the updated project.
///
/// Duplicates are kept: adding the same email twice lists it twice.
pub fn add_member(project: &Project, new_email: &str) -> Project {
    let mut updated = project.clone();
    updated.member_emails.push(new_email.trim().to_string());
    updated
}

/// Emails that can be picked as a task assignee: unique, non-blank,
/// first-occurrence order.
pub fn assignable_members(project: &Project) -> Vec<String> {
    let mut seen = HashSet::new();
    project
        .member_emails
        .iter()
        .map(|email| email.trim())
        .filter(|email| !email.is_empty() && seen.insert(*email))
        .map(str::to_string)
        .collect()
}
