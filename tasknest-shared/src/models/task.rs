/// Task model
///
/// Tasks carry at most one attached image, referenced by `imageUrl`. Setting a
/// new image does not delete the previous blob and deleting a task does not
/// delete its image; only an explicit image removal deletes a blob.
///
/// # Document
///
/// ```text
/// projects/{projectId}/columns/{columnId}/tasks/{id}
///   name:     string
///   userId:   string
///   imageUrl: string | null
/// ```

use crate::models::fields::NewTaskFields;
use crate::models::{Record, RecordKind};
use crate::paths::CollectionPath;
use serde::{Deserialize, Serialize};

/// Task of a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Backend-assigned id
    pub id: String,

    /// Display name
    pub name: String,

    /// Creating principal
    #[serde(rename = "userId")]
    pub owner_id: String,

    /// Parent column, taken from the collection path
    #[serde(skip)]
    pub parent_column_id: String,

    /// URL of the attached image (None when no image)
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Parent collection of a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskScope {
    pub project_id: String,
    pub column_id: String,
}

impl TaskScope {
    pub fn new(project_id: impl Into<String>, column_id: impl Into<String>) -> Self {
        TaskScope {
            project_id: project_id.into(),
            column_id: column_id.into(),
        }
    }
}

/// Image URL merged locally right after a successful attach/detach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOverride {
    /// New URL, or None after a detach
    pub image_url: Option<String>,
}

impl Record for Task {
    type Scope = TaskScope;
    type Override = ImageOverride;
    type NewFields = NewTaskFields;

    const KIND: RecordKind = RecordKind::Task;

    fn collection_path(scope: &TaskScope) -> CollectionPath {
        CollectionPath::tasks(&scope.project_id, &scope.column_id)
    }

    fn new_fields(name: String) -> NewTaskFields {
        NewTaskFields {
            name,
            image_url: None,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bind_scope(&mut self, scope: &TaskScope) {
        self.parent_column_id = scope.column_id.clone();
    }

    fn apply_override(&mut self, local: &ImageOverride) {
        self.image_url = local.image_url.clone();
    }

    fn confirms(&self, local: &ImageOverride) -> bool {
        self.image_url == local.image_url
    }
}
