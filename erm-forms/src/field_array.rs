//! Field-array controller.
//!
//! Binds an ordered list of records stored at one path of the form-state
//! container (`docs`, `alternateNames`, `contacts`, ...) to a list of
//! editable rows. The container owns the items; the controller owns one
//! synthetic key per row so renderers keep row identity across inserts and
//! deletes, when indices shift.

use serde_json::{json, Value};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::form_state::FormState;
use crate::path::FieldPath;

type DeleteConfirmation = Box<dyn Fn(usize, &Value) -> bool>;

/// One row of a field array as seen by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArrayRow<'f> {
    pub index: usize,
    /// Stable identity, never derived from `index`.
    pub key: Ulid,
    /// `name[index]`, the prefix for the row's own fields.
    pub path: FieldPath,
    pub value: &'f Value,
}

impl FieldArrayRow<'_> {
    /// Path of a field inside this row, e.g. `docs[2].url`.
    pub fn field(&self, field: &str) -> FieldPath {
        self.path.child(field)
    }
}

/// The view model handed to a renderer once per render cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArrayView<'f> {
    pub name: FieldPath,
    pub rows: Vec<FieldArrayRow<'f>>,
}

impl FieldArrayView<'_> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Controller for the ordered collection stored at `name`.
pub struct FieldArray {
    name: FieldPath,
    keys: Vec<Ulid>,
    confirm_delete: Option<DeleteConfirmation>,
}

impl FieldArray {
    pub fn new(name: FieldPath) -> Self {
        Self {
            name,
            keys: Vec::new(),
            confirm_delete: None,
        }
    }

    /// Intercept deletes. The callback sees the row index and item and
    /// returns whether the delete goes ahead.
    pub fn with_delete_confirmation(
        mut self,
        confirm: impl Fn(usize, &Value) -> bool + 'static,
    ) -> Self {
        self.confirm_delete = Some(Box::new(confirm));
        self
    }

    pub fn name(&self) -> &FieldPath {
        &self.name
    }

    /// The items currently stored at `name`, empty when unset.
    pub fn items<'f, S: FormState + ?Sized>(&self, form: &'f S) -> &'f [Value] {
        form.get(&self.name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Bring the row keys in line with a container length that changed
    /// outside this controller. Existing keys keep their positions.
    pub fn sync_keys(&mut self, len: usize) {
        if self.keys.len() > len {
            self.keys.truncate(len);
        }
        while self.keys.len() < len {
            self.keys.push(Ulid::new());
        }
    }

    /// Append `item`, or an empty record, to the end of the array.
    pub fn on_add_field<S: FormState + ?Sized>(&mut self, form: &mut S, item: Option<Value>) {
        let mut items = self.items(form).to_vec();
        self.sync_keys(items.len());

        items.push(item.unwrap_or_else(|| json!({})));
        self.keys.push(Ulid::new());

        debug!(name = %self.name, len = items.len(), "field added");
        form.set(&self.name, Value::Array(items));
    }

    /// Remove the item at `index`; later rows move down one position.
    ///
    /// `item` is what the renderer showed for the row and is passed to the
    /// delete confirmation. Returns whether a row was removed.
    pub fn on_delete_field<S: FormState + ?Sized>(
        &mut self,
        form: &mut S,
        index: usize,
        item: &Value,
    ) -> bool {
        let mut items = self.items(form).to_vec();
        self.sync_keys(items.len());

        if index >= items.len() {
            warn!(name = %self.name, index, len = items.len(), "delete out of range ignored");
            return false;
        }
        if let Some(confirm) = &self.confirm_delete {
            if !confirm(index, item) {
                debug!(name = %self.name, index, "delete declined");
                return false;
            }
        }

        items.remove(index);
        self.keys.remove(index);

        debug!(name = %self.name, index, len = items.len(), "field deleted");
        form.set(&self.name, Value::Array(items));
        true
    }

    /// Build the renderer's view: one row per item, renumbered from 0.
    pub fn view<'f, S: FormState + ?Sized>(&mut self, form: &'f S) -> FieldArrayView<'f> {
        let items = self.items(form);
        self.sync_keys(items.len());

        let rows = items
            .iter()
            .zip(&self.keys)
            .enumerate()
            .map(|(index, (value, key))| FieldArrayRow {
                index,
                key: *key,
                path: self.name.index(index),
                value,
            })
            .collect();

        FieldArrayView {
            name: self.name.clone(),
            rows,
        }
    }
}
