//! Signed-in user identity.
//!
//! Authentication itself is external; the core only asks an [`AuthProvider`]
//! who is signed in. [`Identity`] is the resolved value used by the CLI.
//!
//! Resolution order for each field:
//! 1) CLI flag (`--user`, `--email`)
//! 2) `TASKBOARD_USER_ID` / `TASKBOARD_EMAIL` environment variables
//! 3) Config default (`[identity]` in `.taskboard.toml`)
//! 4) Signed out

use serde::Serialize;

use crate::config::IdentityConfig;
use crate::error::{Error, Result};

pub const USER_ID_ENV: &str = "TASKBOARD_USER_ID";
pub const EMAIL_ENV: &str = "TASKBOARD_EMAIL";

pub trait AuthProvider: Send + Sync {
    /// `None` when signed out.
    fn current_user_id(&self) -> Option<String>;

    /// `None` when signed out or when the account has no email.
    fn current_user_email(&self) -> Option<String>;
}

/// A fixed signed-in (or signed-out) user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn signed_in(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        let user_id: String = user_id.into();
        let email: String = email.into();
        Self {
            user_id: non_empty(Some(user_id.as_str())).map(str::to_string),
            email: non_empty(Some(email.as_str())).map(str::to_string),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }
}

impl AuthProvider for Identity {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    fn current_user_email(&self) -> Option<String> {
        self.email.clone()
    }
}

/// Resolve the identity from CLI flags, environment and config.
pub fn resolve_identity(
    cli_user: Option<&str>,
    cli_email: Option<&str>,
    config: &IdentityConfig,
) -> Identity {
    let env_user = std::env::var(USER_ID_ENV).ok();
    let env_email = std::env::var(EMAIL_ENV).ok();

    let user_id = non_empty(cli_user)
        .or_else(|| non_empty(env_user.as_deref()))
        .or_else(|| non_empty(config.user_id.as_deref()))
        .map(str::to_string);
    let email = non_empty(cli_email)
        .or_else(|| non_empty(env_email.as_deref()))
        .or_else(|| non_empty(config.email.as_deref()))
        .map(str::to_string);

    Identity { user_id, email }
}

/// The signed-in user's id and email, or `NotSignedIn`.
pub fn require_user(auth: &dyn AuthProvider) -> Result<(String, String)> {
    let user_id = auth.current_user_id().ok_or(Error::NotSignedIn)?;
    Ok((user_id, auth.current_user_email().unwrap_or_default()))
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
