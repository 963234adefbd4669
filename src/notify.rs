//! Outbound member invitations.
//!
//! Delivery is external and fire-and-forget: a [`Notifier`] accepts an
//! invitation and never reports back. [`InviteOutbox`] queues invitations as
//! JSON lines for a mailer to pick up; [`MemoryOutbox`] keeps them in memory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

pub const INVITE_SCHEMA_VERSION: &str = "taskboard.invite.v1";

pub trait Notifier: Send + Sync {
    fn send_invite(&self, email: &str, subject: &str, body: &str);
}

/// A queued invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invitation {
    pub schema_version: &'static str,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub queued_at: DateTime<Utc>,
}

impl Invitation {
    pub fn new(email: &str, subject: &str, body: &str) -> Self {
        Self {
            schema_version: INVITE_SCHEMA_VERSION,
            email: email.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            queued_at: Utc::now(),
        }
    }

    /// `mailto:` link carrying the subject and body, for handing to a mail client.
    pub fn mailto(&self) -> String {
        format!(
            "mailto:{}?subject={}&body={}",
            urlencoding::encode(&self.email),
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboxDestination {
    Stdout,
    File(PathBuf),
}

impl OutboxDestination {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "-" {
                return Some(OutboxDestination::Stdout);
            }
            Some(OutboxDestination::File(PathBuf::from(trimmed)))
        })
    }

    pub fn open(&self) -> Result<InviteOutbox> {
        match self {
            OutboxDestination::Stdout => Ok(InviteOutbox::stdout()),
            OutboxDestination::File(path) => InviteOutbox::file(path),
        }
    }
}

/// Invitation sink that writes JSONL output to a destination.
pub struct InviteOutbox {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl InviteOutbox {
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(std::io::stdout())),
        }
    }

    /// Append to a file, creating it if necessary.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: Mutex::new(Box::new(file)),
        })
    }

    pub fn emit(&self, invitation: &Invitation) -> Result<()> {
        let serialized = serde_json::to_vec(invitation)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| Error::OperationFailed("invite outbox poisoned".to_string()))?;
        writer.write_all(&serialized)?;
        writer.write_all(b"\n")?;
        writer.flush().map_err(Error::Io)?;
        Ok(())
    }
}

impl Notifier for InviteOutbox {
    fn send_invite(&self, email: &str, subject: &str, body: &str) {
        let invitation = Invitation::new(email, subject, body);
        match self.emit(&invitation) {
            Ok(()) => tracing::debug!(email, "invitation queued"),
            Err(err) => tracing::warn!(email, %err, "failed to queue invitation"),
        }
    }
}

/// Keeps invitations in memory.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<Invitation>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Invitation> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Notifier for MemoryOutbox {
    fn send_invite(&self, email: &str, subject: &str, body: &str) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(Invitation::new(email, subject, body));
        }
        tracing::debug!(email, "invitation recorded");
    }
}
