/// In-memory document store with live queries
///
/// Documents keep insertion order inside their collection. Every write to a
/// collection pushes a fresh filtered snapshot to each live query on that
/// path whose result set changed, unless pushes are paused.

use super::{lock, FaultInjector, FaultPoint};
use crate::backend::{
    BackendError, BackendResult, Document, DocumentStore, FieldFilter, Fields,
    ListenerRegistration, SnapshotFeed, SnapshotResult,
};
use crate::paths::CollectionPath;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

struct Watcher {
    id: u64,
    path: CollectionPath,
    filter: FieldFilter,
    sender: mpsc::UnboundedSender<SnapshotResult>,
    last: Vec<Document>,
}

#[derive(Default)]
struct StoreState {
    collections: HashMap<CollectionPath, Vec<Document>>,
    watchers: Vec<Watcher>,
    next_watcher_id: u64,
    paused: bool,
    dirty: HashSet<CollectionPath>,
}

impl StoreState {
    fn snapshot(&self, path: &CollectionPath, filter: &FieldFilter) -> Vec<Document> {
        self.collections
            .get(path)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(&doc.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify(&mut self, path: &CollectionPath) {
        if self.paused {
            self.dirty.insert(path.clone());
            return;
        }

        let mut closed = Vec::new();
        for index in 0..self.watchers.len() {
            if &self.watchers[index].path != path {
                continue;
            }

            let snapshot = self.snapshot(path, &self.watchers[index].filter);
            let watcher = &mut self.watchers[index];
            if watcher.last == snapshot {
                continue;
            }

            if watcher.sender.send(Ok(snapshot.clone())).is_err() {
                closed.push(watcher.id);
            } else {
                watcher.last = snapshot;
            }
        }

        if !closed.is_empty() {
            self.watchers.retain(|watcher| !closed.contains(&watcher.id));
        }
    }
}

/// Document store kept entirely in memory
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    state: Arc<Mutex<StoreState>>,
    faults: FaultInjector,
}

impl MemoryDocumentStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store sharing a fault injector
    pub fn with_faults(faults: FaultInjector) -> Self {
        MemoryDocumentStore {
            state: Arc::default(),
            faults,
        }
    }

    /// Holds back pushes until [`resume_pushes`](Self::resume_pushes)
    pub fn pause_pushes(&self) {
        lock(&self.state).paused = true;
    }

    /// Pushes one snapshot per collection written while paused
    pub fn resume_pushes(&self) {
        let mut state = lock(&self.state);
        state.paused = false;

        let dirty: Vec<CollectionPath> = state.dirty.drain().collect();
        for path in dirty {
            state.notify(&path);
        }
    }

    /// Number of live queries registered on `path`
    pub fn listener_count(&self, path: &CollectionPath) -> usize {
        lock(&self.state)
            .watchers
            .iter()
            .filter(|watcher| &watcher.path == path && !watcher.sender.is_closed())
            .count()
    }

    /// All documents of a collection, unfiltered
    pub fn documents(&self, path: &CollectionPath) -> Vec<Document> {
        lock(&self.state)
            .collections
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Reads one document
    pub fn document(&self, path: &CollectionPath, id: &str) -> Option<Document> {
        lock(&self.state)
            .collections
            .get(path)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id).cloned())
    }

    fn fault(&self, point: FaultPoint) -> BackendResult<()> {
        if self.faults.should_fail(point) {
            return Err(BackendError::Unavailable(format!(
                "injected {:?} failure",
                point
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn subscribe(&self, path: &CollectionPath, filter: FieldFilter) -> BackendResult<SnapshotFeed> {
        self.fault(FaultPoint::Subscribe)?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_watcher_id;
            state.next_watcher_id += 1;

            // Initial snapshot is delivered even while pushes are paused
            let initial = state.snapshot(path, &filter);
            let _ = sender.send(Ok(initial.clone()));

            state.watchers.push(Watcher {
                id,
                path: path.clone(),
                filter: filter.clone(),
                sender,
                last: initial,
            });
            id
        };

        tracing::debug!(path = %path, filter = %filter, watcher = id, "Registered live query");

        let state = Arc::downgrade(&self.state);
        let registration = ListenerRegistration::new(move || {
            if let Some(state) = state.upgrade() {
                lock(&state).watchers.retain(|watcher| watcher.id != id);
            }
        });

        Ok(SnapshotFeed::new(receiver, registration))
    }

    async fn create(&self, path: &CollectionPath, fields: Fields) -> BackendResult<String> {
        self.fault(FaultPoint::Create)?;

        let id = Uuid::new_v4().simple().to_string();
        let mut state = lock(&self.state);
        state
            .collections
            .entry(path.clone())
            .or_default()
            .push(Document::new(id.clone(), fields));
        state.notify(path);

        Ok(id)
    }

    async fn update(&self, path: &CollectionPath, id: &str, fields: Fields) -> BackendResult<()> {
        self.fault(FaultPoint::Update)?;

        let mut state = lock(&self.state);
        let document = state
            .collections
            .get_mut(path)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| BackendError::NotFound {
                path: path.to_string(),
                id: id.to_string(),
            })?;

        for (key, value) in fields {
            document.fields.insert(key, value);
        }
        state.notify(path);

        Ok(())
    }

    async fn delete(&self, path: &CollectionPath, id: &str) -> BackendResult<()> {
        self.fault(FaultPoint::Delete)?;

        // Deleting a missing document succeeds, like the hosted backend
        let mut state = lock(&self.state);
        let removed = match state.collections.get_mut(path) {
            Some(docs) => {
                let before = docs.len();
                docs.retain(|doc| doc.id != id);
                docs.len() != before
            }
            None => false,
        };

        if removed {
            state.notify(path);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn owner(id: &str) -> FieldFilter {
        FieldFilter::equal("userId", id)
    }

    #[tokio::test]
    async fn test_subscribe_delivers_initial_snapshot() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::projects();
        store
            .create(&path, fields(json!({"name": "A", "userId": "u1"})))
            .await
            .unwrap();

        let mut feed = store.subscribe(&path, owner("u1")).unwrap();
        let snapshot = feed.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].get_str("name"), Some("A"));
    }

    #[tokio::test]
    async fn test_snapshots_are_filtered_by_owner() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::projects();
        let mut feed = store.subscribe(&path, owner("u2")).unwrap();
        assert!(feed.next().await.unwrap().unwrap().is_empty());

        store
            .create(&path, fields(json!({"name": "A", "userId": "u1"})))
            .await
            .unwrap();
        store
            .create(&path, fields(json!({"name": "B", "userId": "u2"})))
            .await
            .unwrap();

        // u1's document never changes u2's result set, so the next push is B
        let next = feed.next().await.unwrap().unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].get_str("name"), Some("B"));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::columns("p1");
        let id = store
            .create(&path, fields(json!({"name": "Todo", "userId": "u1"})))
            .await
            .unwrap();

        store
            .update(&path, &id, fields(json!({"name": "Doing"})))
            .await
            .unwrap();

        let doc = store.document(&path, &id).unwrap();
        assert_eq!(doc.get_str("name"), Some("Doing"));
        assert_eq!(doc.get_str("userId"), Some("u1"));
    }

    #[tokio::test]
    async fn test_identical_update_pushes_nothing() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::projects();
        let id = store
            .create(&path, fields(json!({"name": "A", "userId": "u1"})))
            .await
            .unwrap();
        let mut feed = store.subscribe(&path, owner("u1")).unwrap();
        feed.next().await.unwrap().unwrap();

        store
            .update(&path, &id, fields(json!({"name": "A"})))
            .await
            .unwrap();

        let pending = tokio::time::timeout(std::time::Duration::from_millis(20), feed.next()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let err = store
            .update(&CollectionPath::projects(), "nope", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_document_succeeds() {
        let store = MemoryDocumentStore::new();
        assert!(store.delete(&CollectionPath::projects(), "nope").await.is_ok());
    }

    #[tokio::test]
    async fn test_dropping_feed_releases_listener() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::projects();

        let feed = store.subscribe(&path, owner("u1")).unwrap();
        assert_eq!(store.listener_count(&path), 1);

        drop(feed);
        assert_eq!(store.listener_count(&path), 0);
    }

    #[tokio::test]
    async fn test_paused_pushes_coalesce() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::projects();
        let mut feed = store.subscribe(&path, owner("u1")).unwrap();
        feed.next().await.unwrap().unwrap();

        store.pause_pushes();
        store
            .create(&path, fields(json!({"name": "A", "userId": "u1"})))
            .await
            .unwrap();
        store
            .create(&path, fields(json!({"name": "B", "userId": "u1"})))
            .await
            .unwrap();

        let pending = tokio::time::timeout(std::time::Duration::from_millis(20), feed.next()).await;
        assert!(pending.is_err());

        store.resume_pushes();
        let snapshot = feed.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_injected_create_failure() {
        let faults = FaultInjector::new();
        let store = MemoryDocumentStore::with_faults(faults.clone());
        faults.fail_next(FaultPoint::Create);

        let err = store
            .create(&CollectionPath::projects(), Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
        assert!(store.documents(&CollectionPath::projects()).is_empty());
    }
}
