/// Backend collaborator contracts
///
/// The sync core never talks to the hosted backend directly. It consumes three
/// contracts, each expressed as an async trait:
///
/// - [`DocumentStore`]: live owner-filtered queries plus create/update/delete
/// - [`BlobStore`]: binary uploads, download URLs and deletion
/// - [`IdentityProvider`]: sign-in/sign-up and the current principal
///
/// # Live Queries
///
/// ```text
/// DocumentStore::subscribe(path, userId == uid)
///     │
///     ├──> initial snapshot  [doc, doc, ...]
///     ├──> snapshot after every change on `path`
///     └──> (drop SnapshotFeed) listener released
/// ```
///
/// Every snapshot is the full ordered result set, never a diff.
///
/// An in-memory implementation of all three contracts lives in [`memory`].

use crate::models::Principal;
use crate::paths::CollectionPath;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use tokio::sync::{mpsc, watch};

pub mod error;
pub mod memory;

pub use error::{AuthError, BackendError, BackendResult};

/// Raw document fields as stored by the backend
pub type Fields = Map<String, JsonValue>;

/// Result of a single live-query push
pub type SnapshotResult = Result<Vec<Document>, BackendError>;

/// A document returned by a live query
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Backend-assigned id
    pub id: String,

    /// Stored fields (without the id)
    pub fields: Fields,
}

impl Document {
    /// Creates a document from its id and fields
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Document {
            id: id.into(),
            fields,
        }
    }

    /// Reads a string field
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(JsonValue::as_str)
    }
}

/// Equality filter applied to a live query
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    /// Field name
    pub field: String,

    /// Value the field must equal
    pub value: JsonValue,
}

impl FieldFilter {
    /// `field == value`
    pub fn equal(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        FieldFilter {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Checks whether a document's fields satisfy this filter
    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

impl fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.field, self.value)
    }
}

/// Releases a backend listener when dropped
pub struct ListenerRegistration {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerRegistration {
    /// Creates a registration that runs `release` exactly once
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        ListenerRegistration {
            release: Some(Box::new(release)),
        }
    }

    /// Releases the listener now
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Stream of snapshots produced by a live query
///
/// Snapshots arrive in the order the backend emits them. Dropping the feed
/// releases the backend listener.
#[derive(Debug)]
pub struct SnapshotFeed {
    receiver: mpsc::UnboundedReceiver<SnapshotResult>,
    registration: ListenerRegistration,
}

impl SnapshotFeed {
    /// Wraps a snapshot channel and its backend registration
    pub fn new(
        receiver: mpsc::UnboundedReceiver<SnapshotResult>,
        registration: ListenerRegistration,
    ) -> Self {
        SnapshotFeed {
            receiver,
            registration,
        }
    }

    /// Waits for the next snapshot
    ///
    /// Returns `None` once the backend stops delivering.
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        self.receiver.recv().await
    }

    /// Releases the backend listener and discards queued snapshots
    pub fn close(self) {
        let SnapshotFeed {
            mut receiver,
            registration,
        } = self;
        receiver.close();
        registration.release();
    }
}

/// Handle to an uploaded blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    /// Path the blob was stored under
    pub path: String,
}

/// Document database contract
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a live query on `path` restricted by `filter`
    ///
    /// The feed must yield an initial snapshot immediately, then one full
    /// snapshot per change.
    fn subscribe(&self, path: &CollectionPath, filter: FieldFilter) -> BackendResult<SnapshotFeed>;

    /// Creates a document and returns its backend-assigned id
    async fn create(&self, path: &CollectionPath, fields: Fields) -> BackendResult<String>;

    /// Merges `fields` into an existing document
    async fn update(&self, path: &CollectionPath, id: &str, fields: Fields) -> BackendResult<()>;

    /// Deletes a document
    async fn delete(&self, path: &CollectionPath, id: &str) -> BackendResult<()>;
}

/// Blob storage contract
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Uploads `bytes` under `path`
    async fn upload(&self, path: &str, bytes: Bytes) -> BackendResult<BlobHandle>;

    /// Resolves a retrievable URL for an uploaded blob
    async fn get_url(&self, handle: &BlobHandle) -> BackendResult<String>;

    /// Deletes the blob referenced by `url`
    async fn delete_blob(&self, url: &str) -> BackendResult<()>;
}

/// Authentication provider contract
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Signs in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError>;

    /// Creates an account and signs it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<Principal, AuthError>;

    /// Sends an email verification message to the principal
    async fn send_verification(&self, principal: &Principal) -> Result<(), AuthError>;

    /// Signs the current principal out
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Currently signed-in principal, if any
    fn current_principal(&self) -> Option<Principal>;

    /// Receiver observing every sign-in/sign-out transition
    fn auth_changes(&self) -> watch::Receiver<Option<Principal>>;
}
