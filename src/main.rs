//! taskboard - shared task boards from the command line
//!
//! Projects, status boards, comments, profile counters and a badge
//! leaderboard over a realtime record store export.

use clap::Parser;
use taskboard::cli::Cli;
use taskboard::output::{emit_failure, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    // Tracing is opt-in via RUST_LOG.
    // Keep startup robust in CI/robot envs: ignore invalid/huge filters.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    // Invitations written to stdout would interleave with the JSON envelope.
    let outbox_to_stdout = cli
        .outbox
        .as_deref()
        .map(|value| value.trim() == "-")
        .unwrap_or(false);
    let json = cli.json && !outbox_to_stdout;
    if let Err(err) = cli.run() {
        let _ = emit_failure(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
