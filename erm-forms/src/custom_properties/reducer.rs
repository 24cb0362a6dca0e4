//! Pure state transitions for the custom property editor.
//!
//! `reduce(state, action)` returns the next working state and, when the
//! action touches stored values, the full replacement value map to write
//! back to the container in one `set`.

use erm_fields::Catalogue;
use serde::Serialize;
use tracing::{debug, warn};

use serde_json::Map;

use super::entry::{
    is_available, stored_object, tombstone, tombstone_id_only, write_entry, EntryPatch,
    PropertyValues,
};
use super::state::EditorState;

/// Everything a row can ask the editor to do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    /// Append an empty row; the user picks its definition with `Rename`.
    AddRow,
    /// Remove an optional row.
    DeleteRow { index: usize },
    /// Re-assign a row to another available definition.
    Rename { index: usize, definition: String },
    /// Change one field of a definition's entry.
    EditField { definition: String, patch: EntryPatch },
}

/// Result of one reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: EditorState,
    /// Replacement value map, `None` when stored values are unchanged.
    pub values: Option<PropertyValues>,
}

impl Transition {
    fn unchanged(state: EditorState) -> Self {
        Self { state, values: None }
    }
}

fn is_primary(catalogue: &Catalogue, row: Option<&str>) -> bool {
    row.and_then(|d| catalogue.get(d)).is_some_and(|d| d.primary)
}

/// Definitions a row may be renamed to: every available optional definition
/// not already shown, in catalogue order, after the row's own definition.
/// Primary rows have no targets.
pub fn rename_targets<'c>(
    catalogue: &'c Catalogue,
    state: &EditorState,
    values: &PropertyValues,
    index: usize,
) -> Vec<&'c erm_fields::CustomPropertyDefinition> {
    let current = state.row(index).flatten();
    if is_primary(catalogue, current) {
        return Vec::new();
    }
    let mut targets: Vec<_> = current.and_then(|c| catalogue.get(c)).into_iter().collect();
    targets.extend(catalogue.optional().filter(|def| {
        Some(def.value.as_str()) != current
            && !state.contains(&def.value)
            && is_available(values, &def.value)
    }));
    targets
}

/// Apply `action` to `state`.
///
/// Actions the view model never offers (deleting a primary row, renaming to
/// an unavailable definition, indices past the end) leave everything as is.
pub fn reduce(
    state: EditorState,
    action: Action,
    catalogue: &Catalogue,
    values: &PropertyValues,
) -> Transition {
    let mut state = state;
    match action {
        Action::AddRow => {
            if !catalogue.has_optional() {
                warn!("add row ignored, catalogue has no optional properties");
                return Transition::unchanged(state);
            }
            state.push_placeholder();
            state.mark_structural_edit();
            debug!(rows = state.len(), "custom property row added");
            Transition::unchanged(state)
        }

        Action::DeleteRow { index } => {
            let Some(row) = state.row(index) else {
                warn!(index, "delete ignored, no such row");
                return Transition::unchanged(state);
            };
            if is_primary(catalogue, row) {
                warn!(index, "delete ignored, primary rows are fixed");
                return Transition::unchanged(state);
            }

            let removed = state.remove(index);
            state.mark_structural_edit();
            debug!(index, definition = ?removed, "custom property row deleted");

            let Some(definition) = removed else {
                return Transition::unchanged(state);
            };
            let mut next = values.clone();
            write_entry(&mut next, &definition, tombstone(values, &definition));
            Transition {
                state,
                values: Some(next),
            }
        }

        Action::Rename { index, definition } => {
            let Some(current) = state.row(index).map(|r| r.map(str::to_string)) else {
                warn!(index, "rename ignored, no such row");
                return Transition::unchanged(state);
            };
            if is_primary(catalogue, current.as_deref()) {
                warn!(index, %definition, "rename ignored, primary rows are fixed");
                return Transition::unchanged(state);
            }
            if current.as_deref() == Some(definition.as_str()) {
                return Transition::unchanged(state);
            }
            let offered = rename_targets(catalogue, &state, values, index)
                .iter()
                .any(|d| d.value == definition);
            if !offered {
                warn!(index, %definition, "rename ignored, definition not available");
                return Transition::unchanged(state);
            }

            state.assign(index, definition.clone());
            state.mark_structural_edit();
            debug!(index, from = ?current, to = %definition, "custom property row renamed");

            let mut next = values.clone();
            if let Some(previous) = &current {
                write_entry(&mut next, previous, tombstone_id_only(values, previous));
            }
            write_entry(&mut next, &definition, Map::new());
            Transition {
                state,
                values: Some(next),
            }
        }

        Action::EditField { definition, patch } => {
            if catalogue.get(&definition).is_none() {
                warn!(%definition, "edit ignored, unknown custom property");
                return Transition::unchanged(state);
            }
            let mut entry = stored_object(values, &definition).unwrap_or_default();
            patch.merge_into(&mut entry);
            state.mark_field_edit();

            let mut next = values.clone();
            write_entry(&mut next, &definition, entry);
            Transition {
                state,
                values: Some(next),
            }
        }
    }
}
