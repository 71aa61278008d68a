/// Project model
///
/// # Document
///
/// ```text
/// projects/{id}
///   name:   string
///   userId: string
/// ```

use crate::models::fields::NameFields;
use crate::models::{Record, RecordKind};
use crate::paths::CollectionPath;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

/// Top-level board owned by one principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Backend-assigned id
    pub id: String,

    /// Display name
    pub name: String,

    /// Owning principal
    #[serde(rename = "userId")]
    pub owner_id: String,
}

impl Record for Project {
    type Scope = ();
    type Override = Infallible;
    type NewFields = NameFields;

    const KIND: RecordKind = RecordKind::Project;

    fn collection_path(_scope: &()) -> CollectionPath {
        CollectionPath::projects()
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

    fn bind_scope(&mut self, _scope: &()) {}

    fn apply_override(&mut self, local: &Infallible) {
        match *local {}
    }

    fn confirms(&self, local: &Infallible) -> bool {
        match *local {}
    }
}
