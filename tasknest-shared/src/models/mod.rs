/// Records synchronized by the live sync core
///
/// # Models
///
/// - `principal`: The authenticated identity of the current user
/// - `project`: Top-level boards, stored in `projects`
/// - `column`: Columns of a project, stored in `projects/{id}/columns`
/// - `task`: Tasks of a column, stored in `projects/{id}/columns/{id}/tasks`
/// - `fields`: Write payloads and name validation
///
/// Every record type implements [`Record`], which is what lets one generic
/// subscription/view-state engine serve all three collections.
///
/// # Example
///
/// ```
/// use tasknest_shared::backend::Document;
/// use tasknest_shared::models::{Project, Record};
/// use serde_json::json;
///
/// let fields = json!({"name": "Launch", "userId": "u1"});
/// let doc = Document::new("p1", fields.as_object().unwrap().clone());
/// let project = Project::from_document(doc, &()).unwrap();
/// assert_eq!(project.name, "Launch");
/// assert_eq!(project.owner_id, "u1");
/// ```

use crate::backend::Document;
use crate::paths::CollectionPath;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

pub mod column;
pub mod fields;
pub mod principal;
pub mod project;
pub mod task;

pub use column::Column;
pub use fields::{validate_name, ImageFields, NameFields, NewTaskFields, WriteFields};
pub use principal::Principal;
pub use project::Project;
pub use task::{ImageOverride, Task, TaskScope};

/// The three synchronized collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Project,
    Column,
    Task,
}

impl RecordKind {
    /// Lowercase identifier used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Project => "project",
            RecordKind::Column => "column",
            RecordKind::Task => "task",
        }
    }

    /// Plural form used in user-facing messages
    pub fn plural(&self) -> &'static str {
        match self {
            RecordKind::Project => "projects",
            RecordKind::Column => "columns",
            RecordKind::Task => "tasks",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that lives in an owner-filtered collection
///
/// `Scope` identifies the parent collection (no parent for projects, a
/// project id for columns, project and column ids for tasks). `Override`
/// is the local value a screen may merge ahead of the next push; only tasks
/// have one (their image URL), the other records use [`std::convert::Infallible`].
pub trait Record:
    Clone + fmt::Debug + PartialEq + Send + Sync + DeserializeOwned + 'static
{
    /// Parent collection identifier
    type Scope: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;

    /// Locally merged value awaiting confirmation by a push
    type Override: Clone + fmt::Debug + Send + Sync + 'static;

    /// Fields written when the record is created
    type NewFields: WriteFields;

    /// Which collection this record belongs to
    const KIND: RecordKind;

    /// Collection path for a scope
    fn collection_path(scope: &Self::Scope) -> CollectionPath;

    /// Fields for a new record with the given name
    fn new_fields(name: String) -> Self::NewFields;

    fn id(&self) -> &str;

    fn owner_id(&self) -> &str;

    fn name(&self) -> &str;

    /// Fills in the parent ids, which are not stored in documents
    fn bind_scope(&mut self, scope: &Self::Scope);

    /// Applies a local override on top of the pushed value
    fn apply_override(&mut self, local: &Self::Override);

    /// Whether the pushed value already equals the override
    fn confirms(&self, local: &Self::Override) -> bool;

    /// Decodes a pushed document
    fn from_document(document: Document, scope: &Self::Scope) -> Result<Self, serde_json::Error> {
        let Document { id, mut fields } = document;
        fields.insert("id".to_string(), JsonValue::String(id));

        let mut record: Self = serde_json::from_value(JsonValue::Object(fields))?;
        record.bind_scope(scope);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kind_as_str() {
        assert_eq!(RecordKind::Project.as_str(), "project");
        assert_eq!(RecordKind::Column.as_str(), "column");
        assert_eq!(RecordKind::Task.as_str(), "task");
    }

    #[test]
    fn test_record_kind_plural() {
        assert_eq!(RecordKind::Project.plural(), "projects");
        assert_eq!(RecordKind::Task.plural(), "tasks");
    }

    #[test]
    fn test_record_kinds_match_collections() {
        assert_eq!(Project::KIND, RecordKind::Project);
        assert_eq!(Column::KIND, RecordKind::Column);
        assert_eq!(Task::KIND, RecordKind::Task);
    }
}
