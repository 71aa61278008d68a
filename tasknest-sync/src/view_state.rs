/// Per-screen view state
///
/// Holds the last snapshot delivered by a screen's subscription, the text
/// input draft, and the image overrides merged locally after an
/// attach/detach. Every push replaces the snapshot wholesale and clears all
/// overrides; there is no diffing and no other local mutation.

use std::collections::HashMap;
use tasknest_shared::models::{validate_name, Record};
use validator::ValidationErrors;

/// Text input draft
///
/// `editing_id` is set while the draft renames an existing record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub editing_id: Option<String>,
}

impl Draft {
    pub fn is_editing(&self) -> bool {
        self.editing_id.is_some()
    }
}

/// What a valid draft submits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create { name: String },
    Update { id: String, name: String },
}

/// Snapshot cache, overrides and draft of one screen
#[derive(Debug)]
pub struct ViewState<R: Record> {
    snapshot: Vec<R>,
    pending: HashMap<String, R::Override>,
    draft: Draft,
    revision: u64,
    pushes: u64,
}

impl<R: Record> Default for ViewState<R> {
    fn default() -> Self {
        ViewState {
            snapshot: Vec::new(),
            pending: HashMap::new(),
            draft: Draft::default(),
            revision: 0,
            pushes: 0,
        }
    }
}

impl<R: Record> ViewState<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached records with a pushed snapshot
    ///
    /// Pending overrides are discarded: the push is authoritative whether
    /// it confirms them or not.
    pub fn apply_snapshot(&mut self, records: Vec<R>) {
        for (id, local) in self.pending.drain() {
            match records.iter().find(|record| record.id() == id) {
                Some(record) if record.confirms(&local) => {
                    tracing::debug!(kind = %R::KIND, id = %id, "Override confirmed by push");
                }
                Some(_) => {
                    tracing::debug!(kind = %R::KIND, id = %id, "Override overwritten by push");
                }
                None => {
                    tracing::debug!(kind = %R::KIND, id = %id, "Override dropped, record gone");
                }
            }
        }

        self.snapshot = records;
        self.pushes += 1;
        self.revision += 1;
    }

    /// Merges a local override onto one record until the next push
    ///
    /// Returns false when the record is not in the current snapshot. When
    /// the snapshot already carries the value, the confirming push arrived
    /// first and nothing is left pending.
    pub fn merge_override(&mut self, id: &str, local: R::Override) -> bool {
        let Some(record) = self.snapshot.iter().find(|record| record.id() == id) else {
            return false;
        };

        if record.confirms(&local) {
            tracing::debug!(kind = %R::KIND, id = %id, "Override already confirmed by push");
            self.pending.remove(id);
            return true;
        }

        self.pending.insert(id.to_string(), local);
        self.revision += 1;
        true
    }

    /// Records to display, with overrides applied
    pub fn records(&self) -> Vec<R> {
        self.snapshot
            .iter()
            .map(|record| self.materialize(record))
            .collect()
    }

    /// One displayed record, with its override applied
    pub fn record(&self, id: &str) -> Option<R> {
        self.snapshot
            .iter()
            .find(|record| record.id() == id)
            .map(|record| self.materialize(record))
    }

    fn materialize(&self, record: &R) -> R {
        let mut record = record.clone();
        if let Some(local) = self.pending.get(record.id()) {
            record.apply_override(local);
        }
        record
    }

    /// Last pushed snapshot, without overrides
    pub fn last_snapshot(&self) -> &[R] {
        &self.snapshot
    }

    pub fn has_pending_override(&self, id: &str) -> bool {
        self.pending.contains_key(id)
    }

    /// Increments on every change visible to the presentation layer
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of snapshots applied
    pub fn pushes(&self) -> u64 {
        self.pushes
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
        self.revision += 1;
    }

    /// Starts renaming a record, prefilling the draft with its name
    ///
    /// Returns false when the record is not displayed.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(name) = self
            .snapshot
            .iter()
            .find(|record| record.id() == id)
            .map(|record| record.name().to_string())
        else {
            return false;
        };

        self.draft = Draft {
            text: name,
            editing_id: Some(id.to_string()),
        };
        self.revision += 1;
        true
    }

    pub fn cancel_edit(&mut self) {
        self.clear_draft();
    }

    /// Validates the draft into a submission
    ///
    /// The name is submitted as typed; only its trimmed form must be non-empty.
    pub fn submission(&self) -> Result<Submission, ValidationErrors> {
        validate_name(&self.draft.text)?;

        let name = self.draft.text.clone();
        Ok(match &self.draft.editing_id {
            Some(id) => Submission::Update {
                id: id.clone(),
                name,
            },
            None => Submission::Create { name },
        })
    }

    pub fn clear_draft(&mut self) {
        self.draft = Draft::default();
        self.revision += 1;
    }

    /// Forgets everything, keeping the revision monotonic
    pub fn reset(&mut self) {
        self.snapshot.clear();
        self.pending.clear();
        self.draft = Draft::default();
        self.pushes = 0;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasknest_shared::models::{ImageOverride, Project, Task};

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            owner_id: "u1".to_string(),
        }
    }

    fn task(id: &str, image_url: Option<&str>) -> Task {
        Task {
            id: id.to_string(),
            name: "Write".to_string(),
            owner_id: "u1".to_string(),
            parent_column_id: "c1".to_string(),
            image_url: image_url.map(str::to_string),
        }
    }

    #[test]
    fn test_snapshot_replaces_wholesale() {
        let mut state = ViewState::<Project>::new();
        state.apply_snapshot(vec![project("p1", "A"), project("p2", "B")]);
        state.apply_snapshot(vec![project("p3", "C")]);

        assert_eq!(state.records(), vec![project("p3", "C")]);
        assert_eq!(state.pushes(), 2);
    }

    #[test]
    fn test_override_applies_until_next_push() {
        let mut state = ViewState::<Task>::new();
        state.apply_snapshot(vec![task("t1", None)]);

        let merged = state.merge_override(
            "t1",
            ImageOverride {
                image_url: Some("memory://b/a.jpg".to_string()),
            },
        );
        assert!(merged);
        assert_eq!(
            state.record("t1").unwrap().image_url.as_deref(),
            Some("memory://b/a.jpg")
        );
        assert_eq!(state.last_snapshot()[0].image_url, None);

        // The push wins even when it disagrees
        state.apply_snapshot(vec![task("t1", None)]);
        assert!(!state.has_pending_override("t1"));
        assert_eq!(state.record("t1").unwrap().image_url, None);
    }

    #[test]
    fn test_override_after_confirming_push_is_not_pending() {
        let mut state = ViewState::<Task>::new();
        state.apply_snapshot(vec![task("t1", None)]);

        // The push carrying the new URL lands before the local merge
        state.apply_snapshot(vec![task("t1", Some("memory://b/a.jpg"))]);
        let merged = state.merge_override(
            "t1",
            ImageOverride {
                image_url: Some("memory://b/a.jpg".to_string()),
            },
        );

        assert!(merged);
        assert!(!state.has_pending_override("t1"));
        assert_eq!(
            state.record("t1").unwrap().image_url.as_deref(),
            Some("memory://b/a.jpg")
        );
    }

    #[test]
    fn test_override_for_unknown_record_is_ignored() {
        let mut state = ViewState::<Task>::new();
        state.apply_snapshot(vec![task("t1", None)]);

        assert!(!state.merge_override("t9", ImageOverride { image_url: None }));
        assert!(!state.has_pending_override("t9"));
    }

    #[test]
    fn test_blank_draft_is_rejected_and_kept() {
        let mut state = ViewState::<Project>::new();
        state.set_draft_text("   ");

        let errors = state.submission().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert_eq!(state.draft().text, "   ");
    }

    #[test]
    fn test_submission_keeps_name_as_typed() {
        let mut state = ViewState::<Project>::new();
        state.set_draft_text("  Launch ");

        assert_eq!(
            state.submission().unwrap(),
            Submission::Create {
                name: "  Launch ".to_string()
            }
        );
    }

    #[test]
    fn test_begin_edit_prefills_name() {
        let mut state = ViewState::<Project>::new();
        state.apply_snapshot(vec![project("p1", "Launch")]);

        assert!(state.begin_edit("p1"));
        assert!(state.draft().is_editing());
        assert_eq!(
            state.submission().unwrap(),
            Submission::Update {
                id: "p1".to_string(),
                name: "Launch".to_string()
            }
        );

        state.cancel_edit();
        assert_eq!(state.draft(), &Draft::default());
        assert!(!state.begin_edit("missing"));
    }

    #[test]
    fn test_revision_is_monotonic_across_reset() {
        let mut state = ViewState::<Project>::new();
        state.apply_snapshot(vec![project("p1", "A")]);
        let before = state.revision();

        state.reset();
        assert!(state.revision() > before);
        assert!(state.records().is_empty());
        assert_eq!(state.pushes(), 0);
    }
}
