/// Owner-filtered live queries
///
/// A `CollectionSubscription` opens one live query on a collection, filtered
/// to documents whose `userId` equals the current principal, and hands every
/// snapshot to its listener as a full list of records. Snapshots are
/// delivered in backend order, one at a time, from a dedicated task.
///
/// Closing the subscription releases the backend listener; no snapshot is
/// delivered after `close` returns.
///
/// # Example
///
/// ```no_run
/// use tasknest_shared::models::Project;
/// use tasknest_sync::{AppContext, CollectionSubscription};
///
/// # async fn example(ctx: AppContext) -> Result<(), Box<dyn std::error::Error>> {
/// let subscription = CollectionSubscription::open::<Project, _>(&ctx, &(), |projects| {
///     println!("{} projects", projects.len());
/// })?;
///
/// subscription.close().await;
/// # Ok(())
/// # }
/// ```

use crate::context::AppContext;
use tasknest_shared::backend::{Document, FieldFilter, SnapshotFeed};
use tasknest_shared::models::Record;
use tasknest_shared::paths::{CollectionPath, OWNER_FIELD};
use tasknest_shared::SyncResult;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// An open live query
#[derive(Debug)]
pub struct CollectionSubscription {
    path: CollectionPath,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl CollectionSubscription {
    /// Opens a live query for the records of `scope` owned by the current principal
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` when nobody is signed in; no listener is registered
    /// - `Backend` when the store refuses the subscription
    pub fn open<R, F>(ctx: &AppContext, scope: &R::Scope, listener: F) -> SyncResult<Self>
    where
        R: Record,
        F: FnMut(Vec<R>) + Send + 'static,
    {
        let principal = ctx.identity().require_principal()?;
        let path = R::collection_path(scope);
        let filter = FieldFilter::equal(OWNER_FIELD, principal.id.clone());

        let feed = ctx.documents().subscribe(&path, filter)?;

        tracing::debug!(
            kind = %R::KIND,
            path = %path,
            owner_id = %principal.id,
            "Opened live query"
        );

        let token = CancellationToken::new();
        let handle = tokio::spawn(deliver::<R, F>(
            feed,
            path.clone(),
            scope.clone(),
            principal.id,
            token.clone(),
            listener,
        ));

        Ok(CollectionSubscription {
            path,
            token,
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// Whether the delivery task is still running
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
            && self
                .handle
                .as_ref()
                .map(|handle| !handle.is_finished())
                .unwrap_or(false)
    }

    /// Stops delivery and releases the backend listener
    ///
    /// Waits for the delivery task, so the listener is never invoked after
    /// this returns.
    pub async fn close(mut self) {
        self.token.cancel();

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(path = %self.path, error = %e, "Live query task failed");
            }
        }

        tracing::debug!(path = %self.path, "Closed live query");
    }
}

impl Drop for CollectionSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn deliver<R, F>(
    mut feed: SnapshotFeed,
    path: CollectionPath,
    scope: R::Scope,
    owner_id: String,
    token: CancellationToken,
    mut listener: F,
) where
    R: Record,
    F: FnMut(Vec<R>) + Send + 'static,
{
    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => {
                break;
            }

            next = feed.next() => {
                match next {
                    Some(Ok(documents)) => {
                        let records = materialize::<R>(documents, &scope, &owner_id, &path);
                        tracing::trace!(path = %path, count = records.len(), "Delivering snapshot");
                        listener(records);
                    }
                    Some(Err(e)) => {
                        tracing::error!(path = %path, error = %e, "Live query failed");
                        break;
                    }
                    None => {
                        tracing::debug!(path = %path, "Live query ended by backend");
                        break;
                    }
                }
            }
        }
    }

    feed.close();
}

/// Decodes a snapshot, keeping only records owned by `owner_id`
fn materialize<R: Record>(
    documents: Vec<Document>,
    scope: &R::Scope,
    owner_id: &str,
    path: &CollectionPath,
) -> Vec<R> {
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document.id.clone();
            match R::from_document(document, scope) {
                Ok(record) if record.owner_id() == owner_id => Some(record),
                Ok(record) => {
                    tracing::warn!(
                        path = %path,
                        id = %id,
                        owner_id = %record.owner_id(),
                        "Dropping record owned by another principal"
                    );
                    None
                }
                Err(e) => {
                    tracing::error!(path = %path, id = %id, error = %e, "Failed to decode record, skipping");
                    None
                }
            }
        })
        .collect()
}
