/// Mutation gateway
///
/// Forwards create/update/delete and image attach/detach to the backend.
/// The gateway never touches view state: the result of a write reaches the
/// screen through the same live query as any other change.
///
/// Order of checks for every write: input validation, then the current
/// principal, then the backend call. A rejected write performs no backend
/// call at all.

use crate::context::AppContext;
use chrono::Utc;
use serde_json::Value as JsonValue;
use tasknest_shared::backend::{BackendError, Fields};
use tasknest_shared::models::{ImageFields, WriteFields};
use tasknest_shared::paths::{task_image_path, CollectionPath, OWNER_FIELD};
use tasknest_shared::{SyncError, SyncResult, UploadError};
use validator::Validate;

/// Backend writes on behalf of the current principal
#[derive(Clone)]
pub struct MutationGateway {
    ctx: AppContext,
}

fn encode<F: WriteFields>(fields: &F) -> SyncResult<Fields> {
    fields
        .to_fields()
        .map_err(|e| BackendError::Rejected(format!("failed to encode fields: {}", e)).into())
}

impl MutationGateway {
    pub fn new(ctx: AppContext) -> Self {
        MutationGateway { ctx }
    }

    /// Creates a document owned by `owner_id`
    ///
    /// # Errors
    ///
    /// - `Validation` when the fields are invalid
    /// - `Unauthenticated` when `owner_id` is None
    /// - `Backend` when the store rejects the write
    pub async fn create<F: WriteFields>(
        &self,
        path: &CollectionPath,
        fields: &F,
        owner_id: Option<&str>,
    ) -> SyncResult<String> {
        fields.validate()?;
        let owner_id = owner_id.ok_or(SyncError::Unauthenticated)?;

        let mut document = encode(fields)?;
        document.insert(
            OWNER_FIELD.to_string(),
            JsonValue::String(owner_id.to_string()),
        );

        let id = self.ctx.documents().create(path, document).await?;

        tracing::info!(document = %path.document(&id), owner_id = %owner_id, "Created document");

        Ok(id)
    }

    /// Merges `fields` into an existing document
    pub async fn update<F: WriteFields>(
        &self,
        path: &CollectionPath,
        id: &str,
        fields: &F,
    ) -> SyncResult<()> {
        fields.validate()?;
        self.ctx.identity().require_principal()?;

        let document = encode(fields)?;
        self.ctx.documents().update(path, id, document).await?;

        tracing::info!(document = %path.document(id), "Updated document");

        Ok(())
    }

    /// Deletes a document
    ///
    /// Child collections and attached images are left in place.
    pub async fn delete(&self, path: &CollectionPath, id: &str) -> SyncResult<()> {
        self.ctx.identity().require_principal()?;

        self.ctx.documents().delete(path, id).await?;

        tracing::info!(document = %path.document(id), "Deleted document");

        Ok(())
    }

    /// Uploads a local image and stores its URL on a task
    ///
    /// Returns the download URL. When the blob is uploaded but the task
    /// update fails, the blob stays in storage unreferenced.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` when nobody is signed in
    /// - `Upload` when the image cannot be read, uploaded or resolved
    /// - `Backend` when the task update fails
    pub async fn attach_image(
        &self,
        path: &CollectionPath,
        task_id: &str,
        local_uri: &str,
    ) -> SyncResult<String> {
        self.ctx.identity().require_principal()?;

        let bytes = self.ctx.images().read(local_uri).await?;
        let blob_path = task_image_path(task_id, Utc::now());

        let handle = self
            .ctx
            .blobs()
            .upload(&blob_path, bytes)
            .await
            .map_err(|source| UploadError::Transfer {
                path: blob_path.clone(),
                source,
            })?;

        let url = self
            .ctx
            .blobs()
            .get_url(&handle)
            .await
            .map_err(|source| UploadError::Url {
                path: blob_path.clone(),
                source,
            })?;

        let fields = ImageFields {
            image_url: Some(url.clone()),
        };
        if let Err(e) = self.update(path, task_id, &fields).await {
            tracing::warn!(
                task_id = %task_id,
                blob_path = %blob_path,
                error = %e,
                "Task update failed after upload, blob is orphaned"
            );
            return Err(e);
        }

        tracing::info!(task_id = %task_id, blob_path = %blob_path, "Attached image");

        Ok(url)
    }

    /// Deletes a task's image blob and clears its URL
    ///
    /// When the blob is deleted but the task update fails, the task keeps a
    /// URL pointing at nothing.
    pub async fn detach_image(
        &self,
        path: &CollectionPath,
        task_id: &str,
        image_url: &str,
    ) -> SyncResult<()> {
        self.ctx.identity().require_principal()?;

        self.ctx.blobs().delete_blob(image_url).await?;

        let fields = ImageFields { image_url: None };
        if let Err(e) = self.update(path, task_id, &fields).await {
            tracing::warn!(
                task_id = %task_id,
                image_url = %image_url,
                error = %e,
                "Task update failed after blob delete, image URL is dangling"
            );
            return Err(e);
        }

        tracing::info!(task_id = %task_id, "Detached image");

        Ok(())
    }
}
