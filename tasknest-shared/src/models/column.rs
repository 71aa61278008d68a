/// Column model
///
/// Columns are scoped by their creator, not by project membership: a column
/// is visible to a subscriber iff its `userId` is the subscriber's id, even
/// when the parent project belongs to someone else.
///
/// # Document
///
/// ```text
/// projects/{projectId}/columns/{id}
///   name:   string
///   userId: string
/// ```

use crate::models::fields::NameFields;
use crate::models::{Record, RecordKind};
use crate::paths::CollectionPath;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Column of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Backend-assigned id
    pub id: String,

    /// Display name
    pub name: String,

    /// Creating principal
    #[serde(rename = "userId")]
    pub owner_id: String,

    /// Parent project, taken from the collection path
    #[serde(skip)]
    pub parent_project_id: String,
}

impl Record for Column {
    type Scope = String;
    type Override = Infallible;
    type NewFields = NameFields;

    const KIND: RecordKind = RecordKind::Column;

    fn collection_path(project_id: &String) -> CollectionPath {
        CollectionPath::columns(project_id)
    }

    fn new_fields(name: String) -> NameFields {
        NameFields { name }
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

    fn bind_scope(&mut self, project_id: &String) {
        self.parent_project_id = project_id.clone();
    }

    fn apply_override(&mut self, local: &Infallible) {
        match *local {}
    }

    fn confirms(&self, local: &Infallible) -> bool {
        match *local {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Document;
    use serde_json::json;

    #[test]
    fn test_decode_binds_parent_project() {
        let fields = json!({"name": "Todo", "userId": "u1"});
        let doc = Document::new("c1", fields.as_object().unwrap().clone());

        let column = Column::from_document(doc, &"p7".to_string()).unwrap();
        assert_eq!(column.id, "c1");
        assert_eq!(column.parent_project_id, "p7");
    }

    #[test]
    fn test_parent_project_is_not_serialized() {
        let column = Column {
            id: "c1".to_string(),
            name: "Todo".to_string(),
            owner_id: "u1".to_string(),
            parent_project_id: "p1".to_string(),
        };
        let json = serde_json::to_value(&column).unwrap();
        assert!(json.get("parent_project_id").is_none());
        assert_eq!(json["userId"], "u1");
    }
}
