/// Collection and blob path layout
///
/// The layout is shared with the hosted backend and must stay bit-exact:
///
/// ```text
/// projects
/// projects/{projectId}/columns
/// projects/{projectId}/columns/{columnId}/tasks
///
/// tasks/{taskId}/{uploadTimestampMillis}.jpg   (blob store)
/// ```
///
/// Every document stores its owner under [`OWNER_FIELD`].
///
/// # Example
///
/// ```
/// use tasknest_shared::paths::CollectionPath;
///
/// let path = CollectionPath::tasks("p1", "c1");
/// assert_eq!(path.as_str(), "projects/p1/columns/c1/tasks");
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root collection holding projects
pub const PROJECTS_COLLECTION: &str = "projects";

/// Sub-collection of a project holding its columns
pub const COLUMNS_COLLECTION: &str = "columns";

/// Sub-collection of a column holding its tasks
pub const TASKS_COLLECTION: &str = "tasks";

/// Field used by every live query to scope records to their owner
pub const OWNER_FIELD: &str = "userId";

/// Field holding a record's display name
pub const NAME_FIELD: &str = "name";

/// Blob store prefix for task images
pub const TASK_IMAGE_PREFIX: &str = "tasks";

/// Extension used for every uploaded task image
pub const TASK_IMAGE_EXTENSION: &str = "jpg";

/// Path of a document collection in the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// `projects`
    pub fn projects() -> Self {
        CollectionPath(PROJECTS_COLLECTION.to_string())
    }

    /// `projects/{project_id}/columns`
    pub fn columns(project_id: &str) -> Self {
        CollectionPath(format!(
            "{}/{}/{}",
            PROJECTS_COLLECTION, project_id, COLUMNS_COLLECTION
        ))
    }

    /// `projects/{project_id}/columns/{column_id}/tasks`
    pub fn tasks(project_id: &str, column_id: &str) -> Self {
        CollectionPath(format!(
            "{}/{}/{}/{}/{}",
            PROJECTS_COLLECTION, project_id, COLUMNS_COLLECTION, column_id, TASKS_COLLECTION
        ))
    }

    /// Returns the raw path
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of a single document inside this collection
    pub fn document(&self, id: &str) -> String {
        format!("{}/{}", self.0, id)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Blob path for an image attached to a task
///
/// The timestamp is expressed in epoch milliseconds, so two uploads for the
/// same task land on distinct objects.
pub fn task_image_path(task_id: &str, uploaded_at: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}.{}",
        TASK_IMAGE_PREFIX,
        task_id,
        uploaded_at.timestamp_millis(),
        TASK_IMAGE_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_collection_paths_layout() {
        assert_eq!(CollectionPath::projects().as_str(), "projects");
        assert_eq!(CollectionPath::columns("p1").as_str(), "projects/p1/columns");
        assert_eq!(
            CollectionPath::tasks("p1", "c9").as_str(),
            "projects/p1/columns/c9/tasks"
        );
    }

    #[test]
    fn test_document_path() {
        assert_eq!(
            CollectionPath::columns("p1").document("c2"),
            "projects/p1/columns/c2"
        );
    }

    #[test]
    fn test_display_matches_raw_path() {
        let path = CollectionPath::tasks("a", "b");
        assert_eq!(path.to_string(), path.as_str());
    }

    #[test]
    fn test_task_image_path_uses_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(task_image_path("t1", at), "tasks/t1/1700000000123.jpg");
    }

    #[test]
    fn test_owner_field_name() {
        assert_eq!(OWNER_FIELD, "userId");
    }
}
