//! Profile counters and the badge leaderboard.

use serde::Serialize;

use crate::board::{self, ProfileStats, RankedEntry};
use crate::cli::{BoardContext, GlobalOptions};
use crate::error::{Error, Result};
use crate::identity::require_user;
use crate::model::TaskStatus;
use crate::output::{emit_report, Report};
use crate::view;

pub struct LeaderboardOptions {
    pub limit: Option<usize>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct LeaderboardOutput {
    total: usize,
    entries: Vec<LeaderboardRow>,
}

#[derive(Serialize)]
struct LeaderboardRow {
    #[serde(flatten)]
    entry: RankedEntry,
    gradient: [&'static str; 2],
}

pub fn run_profile(global: GlobalOptions) -> Result<()> {
    let ctx = BoardContext::load(&global, false)?;
    let (_, email) = require_user(&ctx.identity)?;
    let live = view::profile_view(&ctx.store, &email)?;
    let stats: ProfileStats = live
        .try_current()?
        .ok_or_else(|| Error::OperationFailed("profile view produced no snapshot".to_string()))?;
    live.close();

    let mut report = Report::new(if email.is_empty() {
        "Profile".to_string()
    } else {
        format!("Profile {email}")
    });
    for status in TaskStatus::ALL {
        report.field(status.as_str(), stats.counts.get(status).to_string());
    }
    report.field("Badges Earned", stats.badges.to_string());
    if email.is_empty() {
        report.warn("signed-in user has no email; no tasks can be assigned to it");
    }
    emit_report(global.output(), "profile", &stats, &report)
}

pub fn run_leaderboard(options: LeaderboardOptions) -> Result<()> {
    let ctx = BoardContext::load(&options.global, false)?;
    let limit = options.limit.or(ctx.config.leaderboard.limit);
    if limit == Some(0) {
        return Err(Error::InvalidArgument("--limit must be > 0".to_string()));
    }
    let live = view::leaderboard_view(&ctx.store)?;
    let leaderboard = live.try_current()?.unwrap_or_default();
    live.close();

    let entries: Vec<LeaderboardRow> = board::rank_entries(&leaderboard, limit)
        .into_iter()
        .map(|entry| LeaderboardRow {
            gradient: entry.tier.gradient(),
            entry,
        })
        .collect();
    let output = LeaderboardOutput {
        total: leaderboard.len(),
        entries,
    };

    let mut report = Report::new("Leaderboard");
    if output.entries.is_empty() {
        report.line("No data yet");
    }
    for row in &output.entries {
        let who = if row.entry.email.is_empty() {
            "(unassigned)"
        } else {
            row.entry.email.as_str()
        };
        report.line(format!(
            "#{} {} - {} badges ({})",
            row.entry.rank,
            who,
            row.entry.badge_count,
            row.entry.tier.as_str()
        ));
    }
    emit_report(
        options.global.output(),
        "leaderboard",
        &output,
        &report,
    )
}
