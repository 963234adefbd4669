//! Live derived views.
//!
//! A [`LiveView`] owns a scoped subscription to one collection and recomputes
//! its value from scratch on every snapshot. Dropping the view releases the
//! listener.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::board::{self, Board, ProfileStats};
use crate::comments;
use crate::error::{Result, StoreError};
use crate::identity::AuthProvider;
use crate::membership;
use crate::model::{self, Project, UserBadgeCount};
use crate::store::{Record, RecordStore, SnapshotResult, Subscription};

pub const PROJECTS_PATH: &str = "projects";
pub const TASKS_PATH: &str = "tasks";
pub const COMMENTS_PATH: &str = "comments";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    Failed(StoreError),
}

struct Shared<T> {
    state: ViewState<T>,
    updates: u64,
}

pub struct LiveView<'a, T> {
    shared: Arc<Mutex<Shared<T>>>,
    subscription: Subscription<'a>,
}

impl<'a, T> LiveView<'a, T>
where
    T: Clone + Send + 'static,
{
    /// Subscribe to `path` and derive a value from each snapshot with `derive`.
    pub fn open<F>(store: &'a dyn RecordStore, path: &str, derive: F) -> Result<Self>
    where
        F: Fn(&[Record]) -> T + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(Shared {
            state: ViewState::Loading,
            updates: 0,
        }));
        let sink = Arc::clone(&shared);
        let collection = path.to_string();
        let subscription = Subscription::open(
            store,
            path,
            Box::new(move |snapshot: SnapshotResult| {
                let next = match snapshot {
                    Ok(records) => {
                        tracing::debug!(collection = %collection, records = records.len(), "recomputing view");
                        ViewState::Ready(derive(&records))
                    }
                    Err(err) => {
                        tracing::warn!(collection = %collection, %err, "view subscription failed");
                        ViewState::Failed(err)
                    }
                };
                let mut shared = lock(&sink);
                shared.state = next;
                shared.updates += 1;
            }),
        )?;
        Ok(Self {
            shared,
            subscription,
        })
    }

    pub fn state(&self) -> ViewState<T> {
        lock(&self.shared).state.clone()
    }

    /// The latest value, if one has been computed.
    pub fn current(&self) -> Option<T> {
        match &lock(&self.shared).state {
            ViewState::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// The latest value, or the subscription failure as an error.
    pub fn try_current(&self) -> Result<Option<T>> {
        match &lock(&self.shared).state {
            ViewState::Ready(value) => Ok(Some(value.clone())),
            ViewState::Loading => Ok(None),
            ViewState::Failed(err) => Err(err.clone().into()),
        }
    }

    /// Number of snapshots received so far.
    pub fn updates(&self) -> u64 {
        lock(&self.shared).updates
    }

    /// Release the subscription now.
    pub fn close(self) {
        self.subscription.release();
    }
}

fn lock<T>(shared: &Mutex<Shared<T>>) -> MutexGuard<'_, Shared<T>> {
    shared
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Board columns for one project.
pub fn board_view<'a>(store: &'a dyn RecordStore, project_id: &str) -> Result<LiveView<'a, Board>> {
    let project_id = project_id.to_string();
    LiveView::open(store, TASKS_PATH, move |records| {
        board::compute_board(&model::decode_tasks(records), &project_id)
    })
}

pub fn leaderboard_view(store: &dyn RecordStore) -> Result<LiveView<'_, Vec<UserBadgeCount>>> {
    LiveView::open(store, TASKS_PATH, |records| {
        board::compute_leaderboard(&model::decode_tasks(records))
    })
}

pub fn profile_view<'a>(
    store: &'a dyn RecordStore,
    user_email: &str,
) -> Result<LiveView<'a, ProfileStats>> {
    let email = user_email.to_string();
    LiveView::open(store, TASKS_PATH, move |records| {
        board::profile_stats(&model::decode_tasks(records), &email)
    })
}

/// Projects visible to the signed-in user; nothing when signed out.
pub fn projects_view<'a>(
    store: &'a dyn RecordStore,
    auth: &dyn AuthProvider,
) -> Result<LiveView<'a, Vec<Project>>> {
    let user_id = auth.current_user_id().unwrap_or_default();
    let user_email = auth.current_user_email().unwrap_or_default();
    LiveView::open(store, PROJECTS_PATH, move |records| {
        membership::visible_projects(&model::decode_projects(records), &user_id, &user_email)
    })
}

pub fn comments_view<'a>(
    store: &'a dyn RecordStore,
    task_id: &str,
) -> Result<LiveView<'a, Vec<String>>> {
    LiveView::open(
        store,
        &format!("{COMMENTS_PATH}/{task_id}"),
        comments::project_comments,
    )
}

/// Member emails of one project, in stored order.
pub fn members_view<'a>(
    store: &'a dyn RecordStore,
    project_id: &str,
) -> Result<LiveView<'a, Vec<String>>> {
    LiveView::open(
        store,
        &format!("{PROJECTS_PATH}/{project_id}/memberEmails"),
        |records| {
            records
                .iter()
                .filter_map(|record| record.value.as_str().map(str::to_string))
                .collect()
        },
    )
}

/// One-shot read through a subscription that is released before returning.
pub fn read_once<T, F>(store: &dyn RecordStore, path: &str, derive: F) -> Result<T>
where
    T: Clone + Send + 'static,
    F: Fn(&[Record]) -> T + Send + 'static,
{
    let view = LiveView::open(store, path, derive)?;
    let value = view.try_current()?;
    view.close();
    value.ok_or_else(|| {
        crate::error::Error::OperationFailed(format!("no snapshot delivered for '{path}'"))
    })
}
