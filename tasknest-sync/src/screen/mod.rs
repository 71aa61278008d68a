/// Screens
///
/// A [`ListScreen`] is one open view over a collection: it owns its live
/// query, its view state and its draft. Screens never share caches; two
/// screens on the same collection receive their own snapshots.
///
/// - `ProjectListScreen`: the owner's projects
/// - `BoardScreen`: the columns of one project
/// - `TaskScreen`: the tasks of one column, with image attach/detach
/// - `AccountScreen`: sign-in, sign-up and sign-out
///
/// Every action ends with a notice on the screen's [`NoticeSink`]. Errors are
/// also returned so callers can branch on them, but they never need to be
/// handled for the notice to be shown.

use crate::context::AppContext;
use crate::gateway::MutationGateway;
use crate::notice::{Action, Notice, NoticeSink};
use crate::subscription::CollectionSubscription;
use crate::view_state::{Draft, Submission, ViewState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tasknest_shared::models::{Column, ImageOverride, NameFields, Project, Record, Task};
use tasknest_shared::paths::CollectionPath;
use tasknest_shared::SyncResult;
use tokio::sync::watch;

mod account;

pub use account::AccountScreen;

/// Projects of the current principal
pub type ProjectListScreen = ListScreen<Project>;

/// Columns of one project
pub type BoardScreen = ListScreen<Column>;

/// Tasks of one column
pub type TaskScreen = ListScreen<Task>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An open view over one owner-filtered collection
pub struct ListScreen<R: Record> {
    ctx: AppContext,
    gateway: MutationGateway,
    scope: R::Scope,
    state: Arc<Mutex<ViewState<R>>>,
    revision: Arc<watch::Sender<u64>>,
    subscription: Option<CollectionSubscription>,
    notices: NoticeSink,
}

impl<R: Record> ListScreen<R> {
    /// Opens the screen and its live query
    ///
    /// # Errors
    ///
    /// `Unauthenticated` or `Backend` when the live query cannot be opened;
    /// a notice is emitted as well.
    pub fn open(ctx: &AppContext, scope: R::Scope, notices: NoticeSink) -> SyncResult<Self> {
        let (revision, _) = watch::channel(0);

        let mut screen = ListScreen {
            ctx: ctx.clone(),
            gateway: MutationGateway::new(ctx.clone()),
            scope,
            state: Arc::new(Mutex::new(ViewState::new())),
            revision: Arc::new(revision),
            subscription: None,
            notices,
        };

        screen.subscribe()?;
        Ok(screen)
    }

    fn subscribe(&mut self) -> SyncResult<()> {
        let state = Arc::clone(&self.state);
        let revision = Arc::clone(&self.revision);

        let opened = CollectionSubscription::open::<R, _>(&self.ctx, &self.scope, move |records| {
            let current = {
                let mut state = lock(&state);
                state.apply_snapshot(records);
                state.revision()
            };
            revision.send_replace(current);
        });

        match opened {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind = %R::KIND, error = %e, "Failed to open screen");
                self.notices
                    .emit(Notice::record_failure(R::KIND, Action::Load, &e));
                Err(e)
            }
        }
    }

    fn publish(&self) {
        let current = lock(&self.state).revision();
        self.revision.send_replace(current);
    }

    fn path(&self) -> CollectionPath {
        R::collection_path(&self.scope)
    }

    pub fn scope(&self) -> &R::Scope {
        &self.scope
    }

    /// Whether the live query is delivering
    pub fn is_live(&self) -> bool {
        self.subscription
            .as_ref()
            .map(CollectionSubscription::is_active)
            .unwrap_or(false)
    }

    /// Displayed records
    pub fn records(&self) -> Vec<R> {
        lock(&self.state).records()
    }

    pub fn record(&self, id: &str) -> Option<R> {
        lock(&self.state).record(id)
    }

    /// Whether a local override on `id` awaits the next push
    pub fn has_pending_override(&self, id: &str) -> bool {
        lock(&self.state).has_pending_override(id)
    }

    /// Number of snapshots received since open or the last rebind
    pub fn pushes(&self) -> u64 {
        lock(&self.state).pushes()
    }

    pub fn draft(&self) -> Draft {
        lock(&self.state).draft().clone()
    }

    pub fn set_draft_text(&self, text: impl Into<String>) {
        lock(&self.state).set_draft_text(text);
        self.publish();
    }

    /// Starts renaming a displayed record
    pub fn begin_edit(&self, id: &str) -> bool {
        let started = lock(&self.state).begin_edit(id);
        if started {
            self.publish();
        }
        started
    }

    pub fn cancel_edit(&self) {
        lock(&self.state).cancel_edit();
        self.publish();
    }

    /// Receiver notified on every push, merge and draft change
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Submits the draft: creates a record, or renames the one being edited
    ///
    /// Returns the id of the created or renamed record. The draft is cleared
    /// on success only; the new name shows up with the next push.
    pub async fn submit(&self) -> SyncResult<String> {
        let action = if self.draft().is_editing() {
            Action::Update
        } else {
            Action::Create
        };

        match self.write_draft().await {
            Ok(id) => {
                lock(&self.state).clear_draft();
                self.publish();
                self.notices.emit(Notice::record_success(R::KIND, action));
                Ok(id)
            }
            Err(e) => {
                self.notices
                    .emit(Notice::record_failure(R::KIND, action, &e));
                Err(e)
            }
        }
    }

    async fn write_draft(&self) -> SyncResult<String> {
        let submission = lock(&self.state).submission()?;
        let path = self.path();

        match submission {
            Submission::Create { name } => {
                let owner = self.ctx.identity().current_principal();
                self.gateway
                    .create(&path, &R::new_fields(name), owner.as_ref().map(|p| p.id.as_str()))
                    .await
            }
            Submission::Update { id, name } => {
                self.gateway
                    .update(&path, &id, &NameFields { name })
                    .await?;
                Ok(id)
            }
        }
    }

    /// Deletes a record; it disappears with the next push
    pub async fn delete(&self, id: &str) -> SyncResult<()> {
        match self.gateway.delete(&self.path(), id).await {
            Ok(()) => {
                self.notices
                    .emit(Notice::record_success(R::KIND, Action::Delete));
                Ok(())
            }
            Err(e) => {
                self.notices
                    .emit(Notice::record_failure(R::KIND, Action::Delete, &e));
                Err(e)
            }
        }
    }

    /// Points the screen at another parent
    ///
    /// The old live query is closed before the new one opens, and the view
    /// state starts over.
    pub async fn rebind(&mut self, scope: R::Scope) -> SyncResult<()> {
        if let Some(subscription) = self.subscription.take() {
            subscription.close().await;
        }

        lock(&self.state).reset();
        self.publish();

        tracing::debug!(kind = %R::KIND, scope = ?scope, "Rebinding screen");
        self.scope = scope;
        self.subscribe()
    }

    /// Closes the live query; no snapshot is applied after this returns
    pub async fn close(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close().await;
        }
    }
}

impl ListScreen<Task> {
    /// Uploads an image and attaches it to a task
    ///
    /// On success the new URL is merged into the displayed task until the
    /// next push.
    pub async fn attach_image(&self, task_id: &str, local_uri: &str) -> SyncResult<String> {
        match self
            .gateway
            .attach_image(&self.path(), task_id, local_uri)
            .await
        {
            Ok(url) => {
                self.merge_image(task_id, Some(url.clone()));
                self.notices
                    .emit(Notice::record_success(Task::KIND, Action::AttachImage));
                Ok(url)
            }
            Err(e) => {
                self.notices
                    .emit(Notice::record_failure(Task::KIND, Action::AttachImage, &e));
                Err(e)
            }
        }
    }

    /// Deletes a task's image and clears its URL
    pub async fn detach_image(&self, task_id: &str, image_url: &str) -> SyncResult<()> {
        match self
            .gateway
            .detach_image(&self.path(), task_id, image_url)
            .await
        {
            Ok(()) => {
                self.merge_image(task_id, None);
                self.notices
                    .emit(Notice::record_success(Task::KIND, Action::DetachImage));
                Ok(())
            }
            Err(e) => {
                self.notices
                    .emit(Notice::record_failure(Task::KIND, Action::DetachImage, &e));
                Err(e)
            }
        }
    }

    /// Submits the draft, then attaches `image_uri` to the saved task
    ///
    /// A failed attach is logged and does not fail the submit.
    pub async fn submit_with_image(&self, image_uri: Option<&str>) -> SyncResult<String> {
        let id = self.submit().await?;

        if let Some(uri) = image_uri {
            match self.gateway.attach_image(&self.path(), &id, uri).await {
                Ok(url) => self.merge_image(&id, Some(url)),
                Err(e) => {
                    tracing::warn!(task_id = %id, error = %e, "Image upload failed, task saved without image");
                }
            }
        }

        Ok(id)
    }

    fn merge_image(&self, task_id: &str, image_url: Option<String>) {
        let merged = lock(&self.state).merge_override(task_id, ImageOverride { image_url });
        if merged {
            self.publish();
        } else {
            tracing::debug!(task_id = %task_id, "Task not displayed, image merge skipped");
        }
    }
}

impl<R: Record> std::fmt::Debug for ListScreen<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListScreen")
            .field("kind", &R::KIND)
            .field("scope", &self.scope)
            .field("live", &self.is_live())
            .finish()
    }
}
