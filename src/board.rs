//! Task aggregation: board columns, profile counters and the badge leaderboard.
//!
//! Every view is recomputed from the full task snapshot on each call.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::model::{Task, TaskStatus, TaskStatusCounts, UserBadgeCount};
use crate::palette::MedalTier;

/// Tasks of one project grouped into status columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    pub project_id: String,
    pub columns: BTreeMap<TaskStatus, Vec<Task>>,
}

impl Board {
    fn empty(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            columns: TaskStatus::ALL
                .into_iter()
                .map(|status| (status, Vec::new()))
                .collect(),
        }
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        self.columns
            .get(&status)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Group a project's tasks by status, keeping input order inside each column.
/// Tasks with an unrecognized status appear in no column.
pub fn compute_board(tasks: &[Task], project_id: &str) -> Board {
    let mut board = Board::empty(project_id);
    for task in tasks.iter().filter(|task| task.project_id == project_id) {
        match task.status() {
            Some(status) => board.columns.entry(status).or_default().push(task.clone()),
            None => tracing::debug!(
                task_id = %task.id,
                status = %task.status,
                "skipping task with unrecognized status"
            ),
        }
    }
    board
}

/// Count `Done` tasks per assignee across every project, highest first.
/// Ties are ordered by email ascending.
pub fn compute_leaderboard(tasks: &[Task]) -> Vec<UserBadgeCount> {
    let mut badges: HashMap<&str, usize> = HashMap::new();
    for task in tasks {
        if task.status() != Some(TaskStatus::Done) {
            continue;
        }
        *badges.entry(task.assignee_email.as_str()).or_insert(0) += 1;
    }

    let mut leaderboard: Vec<UserBadgeCount> = badges
        .into_iter()
        .map(|(email, badge_count)| UserBadgeCount {
            email: email.to_string(),
            badge_count,
        })
        .collect();
    leaderboard.sort_by(|left, right| {
        right
            .badge_count
            .cmp(&left.badge_count)
            .then_with(|| left.email.cmp(&right.email))
    });
    leaderboard
}

/// Count a user's tasks per status across all projects. An empty email
/// matches nothing.
pub fn compute_user_status_counts(tasks: &[Task], user_email: &str) -> TaskStatusCounts {
    let mut counts = TaskStatusCounts::default();
    if user_email.is_empty() {
        return counts;
    }
    for task in tasks.iter().filter(|task| task.assignee_email == user_email) {
        match task.status() {
            Some(TaskStatus::ToDo) => counts.to_do += 1,
            Some(TaskStatus::InProgress) => counts.in_progress += 1,
            Some(TaskStatus::Done) => counts.done += 1,
            None => {}
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub email: String,
    pub counts: TaskStatusCounts,
    pub badges: usize,
}

/// Profile screen data: status counters plus badges earned (one per done task).
pub fn profile_stats(tasks: &[Task], user_email: &str) -> ProfileStats {
    let counts = compute_user_status_counts(tasks, user_email);
    ProfileStats {
        email: user_email.to_string(),
        badges: counts.done,
        counts,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub email: String,
    pub badge_count: usize,
    pub tier: MedalTier,
}

/// Attach positional medal tiers to a leaderboard, optionally truncated.
pub fn rank_entries(leaderboard: &[UserBadgeCount], limit: Option<usize>) -> Vec<RankedEntry> {
    leaderboard
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
        .map(|(index, entry)| RankedEntry {
            rank: index + 1,
            email: entry.email.clone(),
            badge_count: entry.badge_count,
            tier: MedalTier::for_rank(index),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, project: &str, status: &str, email: &str) -> Task {
        let mut task = Task::new(id, project, id, "", email, None);
        task.status = status.to_string();
        task
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn board_groups_project_tasks_by_status() {
        let tasks = vec![
            task("t0", "p1", "To Do", "a"),
            task("t1", "p1", "Done", "a"),
            task("t2", "p2", "Done", "a"),
        ];
        let board = compute_board(&tasks, "p1");
        assert_eq!(ids(board.column(TaskStatus::ToDo)), vec!["t0"]);
        assert!(board.column(TaskStatus::InProgress).is_empty());
        assert_eq!(ids(board.column(TaskStatus::Done)), vec!["t1"]);
        assert_eq!(board.columns.len(), 3);
    }

    #[test]
    fn board_preserves_order_and_skips_unknown_status() {
        let tasks = vec![
            task("a", "p", "In Progress", ""),
            task("b", "p", "Blocked", ""),
            task("c", "p", "In Progress", ""),
            task("d", "p", "done", ""),
            task("e", "p", "To Do", ""),
        ];
        let board = compute_board(&tasks, "p");
        assert_eq!(ids(board.column(TaskStatus::InProgress)), vec!["a", "c"]);
        assert_eq!(ids(board.column(TaskStatus::ToDo)), vec!["e"]);
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn board_for_unknown_project_is_empty() {
        let tasks = vec![task("a", "p", "To Do", "")];
        let board = compute_board(&tasks, "missing");
        assert!(board.is_empty());
        assert_eq!(board.columns.len(), 3);
    }

    #[test]
    fn leaderboard_counts_done_tasks() {
        let tasks = vec![
            task("1", "p1", "Done", "a"),
            task("2", "p1", "Done", "b"),
            task("3", "p2", "Done", "a"),
        ];
        assert_eq!(
            compute_leaderboard(&tasks),
            vec![
                UserBadgeCount {
                    email: "a".to_string(),
                    badge_count: 2
                },
                UserBadgeCount {
                    email: "b".to_string(),
                    badge_count: 1
                },
            ]
        );
    }

    #[test]
    fn leaderboard_ties_break_by_email() {
        let tasks = vec![
            task("1", "p", "Done", "zoe@x.com"),
            task("2", "p", "Done", "amy@x.com"),
            task("3", "p", "Done", "max@x.com"),
            task("4", "p", "In Progress", "amy@x.com"),
        ];
        let emails: Vec<String> = compute_leaderboard(&tasks)
            .into_iter()
            .map(|entry| entry.email)
            .collect();
        assert_eq!(emails, vec!["amy@x.com", "max@x.com", "zoe@x.com"]);
    }

    #[test]
    fn leaderboard_is_independent_of_input_order() {
        let mut tasks = vec![
            task("1", "p", "Done", "c"),
            task("2", "p", "Done", "a"),
            task("3", "p", "Done", "b"),
            task("4", "p", "Done", "c"),
            task("5", "p", "Done", "a"),
            task("6", "p", "To Do", "b"),
        ];
        let expected = compute_leaderboard(&tasks);
        tasks.reverse();
        assert_eq!(compute_leaderboard(&tasks), expected);
        tasks.rotate_left(2);
        assert_eq!(compute_leaderboard(&tasks), expected);
    }

    #[test]
    fn leaderboard_of_nothing_is_empty() {
        assert!(compute_leaderboard(&[]).is_empty());
        assert!(compute_leaderboard(&[task("1", "p", "To Do", "a")]).is_empty());
    }

    #[test]
    fn leaderboard_groups_blank_assignee() {
        let tasks = vec![task("1", "p", "Done", ""), task("2", "p", "Done", "a")];
        assert_eq!(
            compute_leaderboard(&tasks),
            vec![
                UserBadgeCount {
                    email: String::new(),
                    badge_count: 1
                },
                UserBadgeCount {
                    email: "a".to_string(),
                    badge_count: 1
                },
            ]
        );
    }

    #[test]
    fn status_counts_are_global_and_ignore_unknown() {
        let tasks = vec![
            task("1", "p1", "To Do", "me"),
            task("2", "p2", "In Progress", "me"),
            task("3", "p3", "Done", "me"),
            task("4", "p3", "Done", "me"),
            task("5", "p1", "Archived", "me"),
            task("6", "p1", "Done", "other"),
        ];
        let counts = compute_user_status_counts(&tasks, "me");
        assert_eq!(
            counts,
            TaskStatusCounts {
                to_do: 1,
                in_progress: 1,
                done: 2
            }
        );
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn status_counts_for_empty_email_are_zero() {
        let tasks = vec![task("1", "p1", "Done", "")];
        assert_eq!(compute_user_status_counts(&tasks, "").total(), 0);
    }

    #[test]
    fn profile_badges_equal_done_count() {
        let tasks = vec![task("1", "p", "Done", "me"), task("2", "p", "To Do", "me")];
        let stats = profile_stats(&tasks, "me");
        assert_eq!(stats.badges, 1);
        assert_eq!(stats.counts.to_do, 1);
    }

    #[test]
    fn ranked_entries_assign_medals() {
        let leaderboard: Vec<UserBadgeCount> = ["a", "b", "c", "d"]
            .iter()
            .map(|email| UserBadgeCount {
                email: email.to_string(),
                badge_count: 1,
            })
            .collect();
        let ranked = rank_entries(&leaderboard, None);
        let tiers: Vec<MedalTier> = ranked.iter().map(|entry| entry.tier).collect();
        assert_eq!(
            tiers,
            vec![
                MedalTier::First,
                MedalTier::Second,
                MedalTier::Third,
                MedalTier::Default
            ]
        );
        assert_eq!(ranked[3].rank, 4);
        assert_eq!(rank_entries(&leaderboard, Some(2)).len(), 2);
    }
}
