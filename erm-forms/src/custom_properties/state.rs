//! Working state of the custom property editor.

use erm_fields::Catalogue;
use serde::Serialize;
use tracing::trace;

use super::entry::{is_set, PropertyValues};

/// Where the working list currently comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Nothing derived yet.
    #[default]
    Uninitialized,
    /// Derived from the container while it was pristine.
    Synced,
    /// The user has edited; the working list is authoritative.
    LocallyEdited,
}

/// The rows currently visible, plus the guards that decide whether the
/// container may still overwrite them.
///
/// Each row holds a definition value, or `None` for a freshly added row whose
/// definition has not been picked yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditorState {
    rows: Vec<Option<String>>,
    phase: Phase,
    dirtying: bool,
}

impl EditorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The working list, in row order.
    pub fn rows(&self) -> &[Option<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<Option<&str>> {
        self.rows.get(index).map(|r| r.as_deref())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// A structural edit is in flight; re-derivation is suppressed.
    pub fn dirtying(&self) -> bool {
        self.dirtying
    }

    /// Whether `definition` is assigned to a visible row.
    pub fn contains(&self, definition: &str) -> bool {
        self.rows.iter().any(|r| r.as_deref() == Some(definition))
    }

    /// Re-derive the working list from the container.
    ///
    /// Runs only while the container is pristine and no structural edit is
    /// pending: every catalogue definition with a stored value becomes a row,
    /// in catalogue order. Otherwise the state is returned unchanged.
    pub fn reconciled(self, catalogue: &Catalogue, values: &PropertyValues, pristine: bool) -> Self {
        if !pristine || self.dirtying {
            trace!(pristine, dirtying = self.dirtying, "reconcile skipped");
            return self;
        }
        let rows = catalogue
            .all()
            .iter()
            .filter(|def| is_set(values, &def.value))
            .map(|def| Some(def.value.clone()))
            .collect::<Vec<_>>();
        trace!(rows = rows.len(), "working list derived from form values");
        Self {
            rows,
            phase: Phase::Synced,
            dirtying: false,
        }
    }

    pub(crate) fn push_placeholder(&mut self) {
        self.rows.push(None);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<String> {
        self.rows.remove(index)
    }

    pub(crate) fn assign(&mut self, index: usize, definition: String) -> Option<String> {
        self.rows[index].replace(definition)
    }

    pub(crate) fn mark_structural_edit(&mut self) {
        self.dirtying = true;
        self.phase = Phase::LocallyEdited;
    }

    pub(crate) fn mark_field_edit(&mut self) {
        self.phase = Phase::LocallyEdited;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use erm_fields::{CustomPropertyDefinition, PropertyType};
    use serde_json::json;

    fn catalogue() -> Catalogue {
        Catalogue::new(vec![
            CustomPropertyDefinition::new("a", "A", PropertyType::Text),
            CustomPropertyDefinition::new("b", "B", PropertyType::Number),
            CustomPropertyDefinition::new("c", "C", PropertyType::Decimal),
        ])
        .unwrap()
    }

    fn values(v: serde_json::Value) -> PropertyValues {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn reconcile_follows_catalogue_order() {
        let state = EditorState::new().reconciled(
            &catalogue(),
            &values(json!({ "c": [{}], "a": [{ "value": "x" }] })),
            true,
        );
        assert_eq!(state.rows(), &[Some("a".to_string()), Some("c".to_string())]);
        assert_eq!(state.phase(), Phase::Synced);
    }

    #[test]
    fn reconcile_is_idempotent_while_pristine() {
        let values = values(json!({ "b": [{ "value": 1 }] }));
        let once = EditorState::new().reconciled(&catalogue(), &values, true);
        let twice = once.clone().reconciled(&catalogue(), &values, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn late_values_are_picked_up_while_pristine() {
        let state = EditorState::new().reconciled(&catalogue(), &PropertyValues::new(), true);
        assert!(state.is_empty());
        let state = state.reconciled(&catalogue(), &values(json!({ "a": [{}] })), true);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn dirty_container_blocks_reconcile() {
        let state = EditorState::new().reconciled(&catalogue(), &values(json!({ "a": [{}] })), false);
        assert!(state.is_empty());
        assert_eq!(state.phase(), Phase::Uninitialized);
    }

    #[test]
    fn structural_edit_latches() {
        let mut state = EditorState::new();
        state.push_placeholder();
        state.mark_structural_edit();
        let state = state.reconciled(&catalogue(), &values(json!({ "a": [{}], "b": [{}] })), true);
        assert_eq!(state.rows(), &[None]);
        assert!(state.dirtying());
        assert_eq!(state.phase(), Phase::LocallyEdited);
    }
}
