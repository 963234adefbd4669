//! Record store adapter.
//!
//! The realtime document store is an external collaborator. The core only
//! talks to it through [`RecordStore`]: full-collection snapshots pushed to
//! listeners, plus fire-and-forget writes and removes whose outcome arrives
//! later through an optional completion callback.
//!
//! [`MemoryStore`] is a path-addressed JSON tree with the same semantics,
//! optionally loaded from and saved to a JSON export file.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result, StoreError};
use crate::lock;

/// One child of a collection: its key under the collection path and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: String,
    pub value: Value,
}

impl Record {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Complete point-in-time copy of a collection, in store order.
pub type Snapshot = Vec<Record>;

pub type SnapshotResult = std::result::Result<Snapshot, StoreError>;

pub type Listener = Box<dyn FnMut(SnapshotResult) + Send>;

/// Asynchronous result of a write or remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure { reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

pub type Completion = Box<dyn FnOnce(Outcome) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

pub trait RecordStore: Send + Sync {
    /// Register a listener for the collection at `path`. It fires once with
    /// the current state and again after every change under `path`.
    fn subscribe(&self, path: &str, listener: Listener) -> Result<SubscriptionId>;

    /// Release a listener. Must be called exactly once per subscription.
    fn release(&self, id: SubscriptionId);

    fn write(&self, path: &str, value: Value, done: Option<Completion>);

    fn remove(&self, path: &str, done: Option<Completion>);
}

/// Scoped subscription: registered on open, released on drop.
pub struct Subscription<'a> {
    store: &'a dyn RecordStore,
    id: Option<SubscriptionId>,
}

impl<'a> Subscription<'a> {
    pub fn open(store: &'a dyn RecordStore, path: &str, listener: Listener) -> Result<Self> {
        let id = store.subscribe(path, listener)?;
        tracing::debug!(path, ?id, "subscribed");
        Ok(Self {
            store,
            id: Some(id),
        })
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    /// Release now instead of at end of scope.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(id) = self.id.take() {
            self.store.release(id);
            tracing::debug!(?id, "released subscription");
        }
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Split a store path into segments, rejecting keys the realtime store forbids.
pub fn parse_path(path: &str) -> Result<Vec<String>> {
    let segments: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    if segments.is_empty() {
        return Err(Error::InvalidArgument("store path cannot be empty".to_string()));
    }
    for segment in &segments {
        if segment
            .chars()
            .any(|ch| matches!(ch, '.' | '#' | '$' | '[' | ']') || ch.is_control())
        {
            return Err(Error::InvalidArgument(format!(
                "invalid store key '{segment}' in path '{path}'"
            )));
        }
    }
    Ok(segments)
}

struct ListenerEntry {
    path: Vec<String>,
    listener: Arc<Mutex<Listener>>,
}

struct Delivery {
    id: u64,
    snapshot: SnapshotResult,
}

#[derive(Default)]
struct Inner {
    root: Map<String, Value>,
    next_id: u64,
    listeners: BTreeMap<u64, ListenerEntry>,
    denied: Vec<Vec<String>>,
    queue: VecDeque<Delivery>,
    dispatching: bool,
}

impl Inner {
    fn is_denied(&self, path: &[String]) -> bool {
        self.denied.iter().any(|rule| path.starts_with(rule))
    }

    fn snapshot(&self, path: &[String]) -> Snapshot {
        let mut node = self.root.get(&path[0]);
        for segment in &path[1..] {
            node = match node {
                Some(Value::Object(map)) => map.get(segment),
                Some(Value::Array(items)) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            };
        }
        match node {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(key, value)| Record::new(key.clone(), value.clone()))
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.is_null())
                .map(|(index, value)| Record::new(index.to_string(), value.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn set(&mut self, path: &[String], value: Value) {
        if value.is_null() {
            remove_at(&mut self.root, path);
        } else {
            set_at(&mut self.root, path, value);
        }
    }

    /// Fresh snapshots for every listener whose collection overlaps `changed`.
    fn deliveries_for(&self, changed: &[String]) -> Vec<Delivery> {
        self.listeners
            .iter()
            .filter(|(_, entry)| {
                entry.path.starts_with(changed) || changed.starts_with(&entry.path)
            })
            .map(|(id, entry)| Delivery {
                id: *id,
                snapshot: Ok(self.snapshot(&entry.path)),
            })
            .collect()
    }
}

fn set_at(map: &mut Map<String, Value>, path: &[String], value: Value) {
    let (head, rest) = (&path[0], &path[1..]);
    if rest.is_empty() {
        map.insert(head.clone(), value);
        return;
    }
    let child = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Array(items) = &mut *child {
        // Index-keyed lists become objects once addressed by key.
        let converted: Map<String, Value> = items
            .drain(..)
            .enumerate()
            .filter(|(_, value)| !value.is_null())
            .map(|(index, value)| (index.to_string(), value))
            .collect();
        *child = Value::Object(converted);
    }
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(inner) = child {
        set_at(inner, rest, value);
    }
}

/// Remove the value at `path`, pruning parents left empty.
fn remove_at(map: &mut Map<String, Value>, path: &[String]) {
    let (head, rest) = (&path[0], &path[1..]);
    if rest.is_empty() {
        map.remove(head);
        return;
    }
    let now_empty = match map.get_mut(head) {
        Some(Value::Object(inner)) => {
            remove_at(inner, rest);
            inner.is_empty()
        }
        _ => false,
    };
    if now_empty {
        map.remove(head);
    }
}

fn lock_listener(listener: &Mutex<Listener>) -> MutexGuard<'_, Listener> {
    listener
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process realtime store backed by a JSON document tree.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an exported document. Non-object roots start empty.
    pub fn from_value(root: Value) -> Self {
        let root = match root {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                tracing::warn!(kind = ?other, "store export root is not an object, starting empty");
                Map::new()
            }
        };
        Self {
            inner: Mutex::new(Inner {
                root,
                ..Inner::default()
            }),
        }
    }

    /// Load a JSON export file. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "data file missing, starting empty");
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let root: Value = serde_json::from_str(&content)?;
        Ok(Self::from_value(root))
    }

    /// Atomically write the document tree as a JSON export file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.export())?;
        lock::write_atomic(path, json.as_bytes())
    }

    pub fn export(&self) -> Value {
        Value::Object(self.lock().root.clone())
    }

    /// Deny reads and writes under `path`, as a store security rule would.
    pub fn deny(&self, path: &str) -> Result<()> {
        let segments = parse_path(path)?;
        self.lock().denied.push(segments);
        Ok(())
    }

    /// Read the collection at `path` once, without subscribing.
    pub fn read(&self, path: &str) -> Result<Snapshot> {
        let segments = parse_path(path)?;
        let inner = self.lock();
        if inner.is_denied(&segments) {
            return Err(StoreError::new(path, "permission denied").into());
        }
        Ok(inner.snapshot(&segments))
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mutate(&self, path: &str, value: Value, done: Option<Completion>) {
        let outcome = match parse_path(path) {
            Err(err) => Outcome::Failure {
                reason: err.to_string(),
            },
            Ok(segments) => {
                let mut inner = self.lock();
                if inner.is_denied(&segments) {
                    Outcome::Failure {
                        reason: "permission denied".to_string(),
                    }
                } else {
                    inner.set(&segments, value);
                    let deliveries = inner.deliveries_for(&segments);
                    drop(inner);
                    self.dispatch(deliveries);
                    Outcome::Success
                }
            }
        };
        match &outcome {
            Outcome::Success => tracing::debug!(path, "store write applied"),
            Outcome::Failure { reason } => tracing::warn!(path, %reason, "store write rejected"),
        }
        if let Some(done) = done {
            done(outcome);
        }
    }

    /// Deliver snapshots outside the state lock. Listeners may write back into
    /// the store; nested deliveries are queued and drained by the outer call.
    fn dispatch(&self, deliveries: Vec<Delivery>) {
        {
            let mut inner = self.lock();
            inner.queue.extend(deliveries);
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }
        let _unwind = DispatchReset { store: self };
        loop {
            let (delivery, listener) = {
                let mut inner = self.lock();
                let Some(delivery) = inner.queue.pop_front() else {
                    inner.dispatching = false;
                    return;
                };
                let listener = inner
                    .listeners
                    .get(&delivery.id)
                    .map(|entry| Arc::clone(&entry.listener));
                (delivery, listener)
            };
            if let Some(listener) = listener {
                let mut callback = lock_listener(&listener);
                (*callback)(delivery.snapshot);
            }
        }
    }
}

/// Clears the dispatch flag and pending deliveries when a listener panics, so
/// later writes and subscriptions still notify.
struct DispatchReset<'a> {
    store: &'a MemoryStore,
}

impl Drop for DispatchReset<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut inner = self.store.lock();
            inner.dispatching = false;
            inner.queue.clear();
        }
    }
}

impl RecordStore for MemoryStore {
    fn subscribe(&self, path: &str, mut listener: Listener) -> Result<SubscriptionId> {
        let segments = parse_path(path)?;
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        if inner.is_denied(&segments) {
            drop(inner);
            tracing::warn!(path, "subscription rejected: permission denied");
            listener(Err(StoreError::new(path, "permission denied")));
            return Ok(SubscriptionId(id));
        }
        let initial = inner.snapshot(&segments);
        inner.listeners.insert(
            id,
            ListenerEntry {
                path: segments,
                listener: Arc::new(Mutex::new(listener)),
            },
        );
        drop(inner);
        self.dispatch(vec![Delivery {
            id,
            snapshot: Ok(initial),
        }]);
        Ok(SubscriptionId(id))
    }

    fn release(&self, id: SubscriptionId) {
        let mut inner = self.lock();
        inner.listeners.remove(&id.0);
        inner.queue.retain(|delivery| delivery.id != id.0);
    }

    fn write(&self, path: &str, value: Value, done: Option<Completion>) {
        self.mutate(path, value, done);
    }

    fn remove(&self, path: &str, done: Option<Completion>) {
        self.mutate(path, Value::Null, done);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collect<'a>(store: &'a MemoryStore, path: &str) -> (Subscription<'a>, Arc<Mutex<Vec<SnapshotResult>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = Subscription::open(
            store,
            path,
            Box::new(move |snapshot: SnapshotResult| sink.lock().unwrap().push(snapshot)),
        )
        .expect("subscribe");
        (subscription, seen)
    }

    fn keys(snapshot: &SnapshotResult) -> Vec<String> {
        snapshot
            .as_ref()
            .expect("snapshot")
            .iter()
            .map(|record| record.key.clone())
            .collect()
    }

    #[test]
    fn parse_path_rejects_forbidden_keys() {
        assert_eq!(parse_path("/tasks//t1/").unwrap(), vec!["tasks", "t1"]);
        assert!(parse_path("").is_err());
        assert!(parse_path("tasks/a.b").is_err());
        assert!(parse_path("tasks/$x").is_err());
    }

    #[test]
    fn subscribe_fires_immediately_and_on_change() {
        let store = MemoryStore::new();
        store.write("tasks/t1", json!({ "title": "one" }), None);

        let (_subscription, seen) = collect(&store, "tasks");
        store.write("tasks/t2", json!({ "title": "two" }), None);
        store.remove("tasks/t1", None);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(keys(&seen[0]), vec!["t1"]);
        assert_eq!(keys(&seen[1]), vec!["t1", "t2"]);
        assert_eq!(keys(&seen[2]), vec!["t2"]);
    }

    #[test]
    fn unrelated_writes_do_not_notify() {
        let store = MemoryStore::new();
        let (_subscription, seen) = collect(&store, "comments/t1");
        store.write("comments/t2/c1", json!({ "text": "x" }), None);
        store.write("projects/p1", json!({ "title": "p" }), None);
        assert_eq!(seen.lock().unwrap().len(), 1);

        store.write("comments/t1/c1", json!({ "text": "y" }), None);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn dropping_subscription_releases_listener() {
        let store = MemoryStore::new();
        let (subscription, seen) = collect(&store, "tasks");
        assert_eq!(store.listener_count(), 1);
        drop(subscription);
        assert_eq!(store.listener_count(), 0);

        store.write("tasks/t1", json!({}), None);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn denied_subscription_reports_failure() {
        let store = MemoryStore::new();
        store.deny("projects").unwrap();
        let (_subscription, seen) = collect(&store, "projects");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let err = seen[0].as_ref().unwrap_err();
        assert_eq!(err.collection, "projects");
        assert_eq!(err.reason, "permission denied");
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn store_keeps_notifying_after_listener_panic() {
        let store = MemoryStore::new();
        let calls = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&calls);
        let id = store
            .subscribe(
                "tasks",
                Box::new(move |_snapshot: SnapshotResult| {
                    let mut calls = counter.lock().unwrap();
                    *calls += 1;
                    if *calls == 2 {
                        drop(calls);
                        panic!("listener failed");
                    }
                }),
            )
            .unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.write("tasks/t1", json!({}), None);
        }));
        assert!(result.is_err());
        store.release(id);
        assert_eq!(store.listener_count(), 0);

        let (_subscription, seen) = collect(&store, "tasks");
        assert_eq!(seen.lock().unwrap().len(), 1);
        store.write("tasks/t2", json!({}), None);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(keys(&seen[1]), vec!["t1", "t2"]);
    }

    #[test]
    fn denied_write_reports_failure_outcome() {
        let store = MemoryStore::new();
        store.deny("tasks").unwrap();
        let outcome = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&outcome);
        store.write(
            "tasks/t1",
            json!({}),
            Some(Box::new(move |result: Outcome| *sink.lock().unwrap() = Some(result))),
        );
        assert_eq!(
            outcome.lock().unwrap().clone(),
            Some(Outcome::Failure {
                reason: "permission denied".to_string()
            })
        );
        assert!(store.export()["tasks"].is_null());
    }

    #[test]
    fn listener_may_write_back_into_store() {
        let store = Arc::new(MemoryStore::new());
        let writer = Arc::clone(&store);
        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        let id = store
            .subscribe(
                "tasks",
                Box::new(move |snapshot: SnapshotResult| {
                    *counter.lock().unwrap() += 1;
                    let count = snapshot.map(|records| records.len()).unwrap_or(0);
                    if count == 1 {
                        writer.write("tasks/t2", json!({}), None);
                    }
                }),
            )
            .unwrap();
        store.write("tasks/t1", json!({}), None);
        assert_eq!(*seen.lock().unwrap(), 3);
        assert_eq!(store.read("tasks").unwrap().len(), 2);
        store.release(id);
    }

    #[test]
    fn removing_last_child_prunes_parent() {
        let store = MemoryStore::new();
        store.write("comments/t1/c1", json!({ "text": "x" }), None);
        store.remove("comments/t1/c1", None);
        assert_eq!(store.export(), json!({}));
    }

    #[test]
    fn writing_into_list_converts_to_keyed_object() {
        let store = MemoryStore::from_value(json!({
            "projects": { "p1": { "memberEmails": ["a@x.com"] } }
        }));
        store.write("projects/p1/memberEmails/1", json!("b@x.com"), None);
        let records = store.read("projects/p1/memberEmails").unwrap();
        let emails: Vec<&str> = records.iter().filter_map(|r| r.value.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("board.json");
        let store = MemoryStore::new();
        store.write("projects/p1", json!({ "title": "Board" }), None);
        store.save(&path).expect("save");

        let loaded = MemoryStore::load(&path).expect("load");
        assert_eq!(loaded.export(), store.export());
        assert_eq!(
            MemoryStore::load(&dir.path().join("missing.json"))
                .unwrap()
                .export(),
            json!({})
        );
    }
}
