//! taskboard - client-side core of a shared task board
//!
//! Turns raw snapshots from a realtime record store into the views a task
//! board renders, and issues mutations back through the store.
//!
//! # Core Concepts
//!
//! - **Snapshots**: full copies of a collection pushed to listeners on every change
//! - **Derived views**: board columns, profile counters, leaderboard, visible
//!   projects and comment threads, recomputed from scratch per snapshot
//! - **Badges**: one per `Done` task, credited to its assignee
//! - **Commands**: fire-and-forget writes with an asynchronous outcome
//!
//! # Module Organization
//!
//! - `store`: record store trait, scoped subscriptions and the in-memory store
//! - `model`: projects, tasks, comments and lenient record decoding
//! - `board`: board columns, status counters and the badge leaderboard
//! - `membership`: project visibility and member lists
//! - `comments`: comment thread projection
//! - `palette`: card colors and medal tiers
//! - `view`: live views over store subscriptions
//! - `commands`: project, task and comment mutations
//! - `identity`: signed-in user resolution
//! - `notify`: member invitations
//! - `config`: configuration loading from `.taskboard.toml`
//! - `error`: error types and result aliases
//! - `lock`: data file locking and atomic writes
//! - `output`: human and JSON output for the CLI
//! - `cli`: command-line interface using clap

pub mod board;
pub mod cli;
pub mod commands;
pub mod comments;
pub mod config;
pub mod error;
pub mod identity;
pub mod lock;
pub mod membership;
pub mod model;
pub mod notify;
pub mod output;
pub mod palette;
pub mod store;
pub mod view;

pub use error::{Error, Result};
