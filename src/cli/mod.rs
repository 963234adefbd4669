//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity::{resolve_identity, Identity};
use crate::lock::FileLock;
use crate::model::{self, Project, Task};
use crate::store::{Completion, MemoryStore, Outcome};
use crate::view::{self, PROJECTS_PATH, TASKS_PATH};

mod comment;
mod project;
mod stats;
mod task;

/// taskboard - shared task boards
///
/// Projects, per-status task boards, comment threads, profile counters and a
/// badge leaderboard over a realtime record store export.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data file holding the store export (defaults to [store] data_file)
    #[arg(long, global = true, env = "TASKBOARD_DATA")]
    pub data: Option<PathBuf>,

    /// Signed-in user id
    #[arg(long, global = true, env = "TASKBOARD_USER_ID")]
    pub user: Option<String>,

    /// Signed-in user email
    #[arg(long, global = true, env = "TASKBOARD_EMAIL")]
    pub email: Option<String>,

    /// Invitation outbox: a JSONL file path or "-" for stdout
    #[arg(long, global = true, env = "TASKBOARD_OUTBOX")]
    pub outbox: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Project management
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Task board and task changes
    #[command(subcommand)]
    Task(TaskCommands),

    /// Task comment threads
    #[command(subcommand)]
    Comment(CommentCommands),

    /// Show task counts and badges for the signed-in user
    Profile,

    /// Show users ranked by completed tasks
    Leaderboard {
        /// Show at most this many entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Project subcommands
#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// List projects visible to the signed-in user
    List,

    /// Create a project owned by the signed-in user
    New {
        /// Project title
        title: String,

        /// Project description
        #[arg(short, long)]
        description: String,
    },

    /// Add a member email to a project and send an invitation
    Invite {
        /// Project ID
        project: String,

        /// Email address to invite
        email: String,
    },

    /// List the members of a project
    Members {
        /// Project ID
        project: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Show a project's board columns
    Board {
        /// Project ID
        project: String,
    },

    /// Create a task in a project
    New {
        /// Project ID
        project: String,

        /// Task title
        title: String,

        /// Task description
        #[arg(short, long)]
        description: String,

        /// Assignee email (defaults to the signed-in user)
        #[arg(long)]
        assignee: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },

    /// Change a task's status: todo, in-progress, done
    Status {
        /// Task ID
        id: String,

        /// New status
        status: String,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
}

/// Comment subcommands
#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// List a task's comments in posting order
    List {
        /// Task ID
        task: String,
    },

    /// Post a comment on a task
    Post {
        /// Task ID
        task: String,

        /// Comment text
        text: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = GlobalOptions {
            data: self.data,
            user: self.user,
            email: self.email,
            outbox: self.outbox,
            json: self.json,
            quiet: self.quiet,
        };
        match self.command {
            Commands::Project(cmd) => match cmd {
                ProjectCommands::List => project::run_list(global),
                ProjectCommands::New { title, description } => {
                    project::run_new(project::NewOptions {
                        title,
                        description,
                        global,
                    })
                }
                ProjectCommands::Invite { project, email } => {
                    project::run_invite(project::InviteOptions {
                        project,
                        email,
                        global,
                    })
                }
                ProjectCommands::Members { project } => {
                    project::run_members(project::MembersOptions { project, global })
                }
            },
            Commands::Task(cmd) => match cmd {
                TaskCommands::Board { project } => {
                    task::run_board(task::BoardOptions { project, global })
                }
                TaskCommands::New {
                    project,
                    title,
                    description,
                    assignee,
                    due,
                } => task::run_new(task::NewOptions {
                    project,
                    title,
                    description,
                    assignee,
                    due,
                    global,
                }),
                TaskCommands::Status { id, status } => {
                    task::run_status(task::StatusOptions { id, status, global })
                }
                TaskCommands::Delete { id } => {
                    task::run_delete(task::DeleteOptions { id, global })
                }
            },
            Commands::Comment(cmd) => match cmd {
                CommentCommands::List { task } => {
                    comment::run_list(comment::ListOptions { task, global })
                }
                CommentCommands::Post { task, text } => {
                    comment::run_post(comment::PostOptions { task, text, global })
                }
            },
            Commands::Profile => stats::run_profile(global),
            Commands::Leaderboard { limit } => {
                stats::run_leaderboard(stats::LeaderboardOptions { limit, global })
            }
        }
    }
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub data: Option<PathBuf>,
    pub user: Option<String>,
    pub email: Option<String>,
    pub outbox: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn output(&self) -> crate::output::OutputOptions {
        crate::output::OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

/// Loaded store plus the resolved identity for one command.
pub(crate) struct BoardContext {
    pub config: Config,
    pub identity: Identity,
    pub store: MemoryStore,
    pub data_path: PathBuf,
    _lock: Option<FileLock>,
}

impl BoardContext {
    /// Load config from the working directory and the store from the data file.
    /// Mutating commands hold the data file lock until the context drops.
    pub fn load(global: &GlobalOptions, mutating: bool) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let config = Config::load_from_dir(&cwd)?;
        let identity = resolve_identity(
            global.user.as_deref(),
            global.email.as_deref(),
            &config.identity,
        );
        let data_path = match &global.data {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => cwd.join(path),
            None => config.data_path(&cwd),
        };
        let lock = if mutating {
            Some(FileLock::for_data_file(
                &data_path,
                config.store.lock_timeout_ms,
            )?)
        } else {
            None
        };
        let store = MemoryStore::load(&data_path)?;
        tracing::debug!(
            data = %data_path.display(),
            signed_in = identity.is_signed_in(),
            "loaded board context"
        );
        Ok(Self {
            config,
            identity,
            store,
            data_path,
            _lock: lock,
        })
    }

    /// Write the store back to the data file.
    pub fn persist(&self) -> Result<()> {
        self.store.save(&self.data_path)?;
        tracing::debug!(data = %self.data_path.display(), "saved data file");
        Ok(())
    }

    pub fn user_email(&self) -> String {
        self.identity.email.clone().unwrap_or_default()
    }

    pub fn user_id(&self) -> String {
        self.identity.user_id.clone().unwrap_or_default()
    }

    /// All projects in the store, decoded.
    pub fn projects(&self) -> Result<Vec<Project>> {
        view::read_once(&self.store, PROJECTS_PATH, model::decode_projects)
    }

    pub fn tasks(&self) -> Result<Vec<Task>> {
        view::read_once(&self.store, TASKS_PATH, model::decode_tasks)
    }

    /// A project the signed-in user can see; anything else is reported as missing.
    pub fn visible_project(&self, project_id: &str) -> Result<Project> {
        self.projects()?
            .into_iter()
            .find(|project| project.id == project_id)
            .filter(|project| {
                crate::membership::is_member(project, &self.user_id(), &self.user_email())
            })
            .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))
    }

    /// A task whose project the signed-in user can see.
    pub fn visible_task(&self, task_id: &str) -> Result<(Task, Project)> {
        let task = self
            .tasks()?
            .into_iter()
            .find(|task| task.id == task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        let project = self
            .visible_project(&task.project_id)
            .map_err(|_| Error::TaskNotFound(task_id.to_string()))?;
        Ok((task, project))
    }
}

/// Collects store outcomes for the writes one command issues.
#[derive(Clone, Default)]
pub(crate) struct WriteTracker {
    outcomes: Arc<Mutex<Vec<(String, Outcome)>>>,
}

impl WriteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completion(&self, path: impl Into<String>) -> Option<Completion> {
        let outcomes = Arc::clone(&self.outcomes);
        let path = path.into();
        Some(Box::new(move |outcome: Outcome| {
            if let Ok(mut outcomes) = outcomes.lock() {
                outcomes.push((path, outcome));
            }
        }))
    }

    /// First failed write, if any.
    pub fn finish(&self) -> Result<()> {
        let outcomes = self
            .outcomes
            .lock()
            .map_err(|_| Error::OperationFailed("write tracker poisoned".to_string()))?;
        for (path, outcome) in outcomes.iter() {
            if let Outcome::Failure { reason } = outcome {
                return Err(Error::WriteFailed {
                    path: path.clone(),
                    reason: reason.clone(),
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
