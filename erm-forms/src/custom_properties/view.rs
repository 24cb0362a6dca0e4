//! Render-only view model of the custom property editor.

use erm_fields::{Catalogue, CustomPropertyDefinition};
use serde_json::Value;

use super::entry::{entry_path, read_entry, CustomPropertyEntry, PropertyValues};
use super::reducer::rename_targets;
use super::state::EditorState;
use super::validate::{DecimalFormat, PropertyValidator};
use crate::path::FieldPath;
use crate::validators::{FieldMeta, ValidationError, Validator};

/// One row as handed to a presentational component.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRow<'c> {
    /// `None` while the user has not picked a definition for a new row.
    pub definition: Option<&'c CustomPropertyDefinition>,
    pub entry: CustomPropertyEntry,
    /// Position in the working list; the index passed to rename and delete.
    /// Primary rows without a stored value have none.
    pub row_index: Option<usize>,
    /// User-facing number, counted from 1 within the optional group.
    pub number: Option<usize>,
    /// Visibility with the definition default applied.
    pub internal: bool,
    pub available_for_rename: Vec<&'c CustomPropertyDefinition>,
    pub deletable: bool,
    /// Path of the row's value field, e.g. `customProperties.authIP[0].value`.
    pub value_path: Option<FieldPath>,
    pub error: Option<ValidationError>,
    /// Set on rows still waiting for a definition.
    pub name_error: Option<ValidationError>,
}

/// Rows grouped for display. A group is `None` when the catalogue has no
/// definitions of that kind, so the section is not rendered at all.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomPropertiesView<'c> {
    pub primary: Option<Vec<PropertyRow<'c>>>,
    pub optional: Option<Vec<PropertyRow<'c>>>,
    pub can_add_row: bool,
    pub primary_section_label: String,
    pub optional_section_label: String,
    pub translation_key: String,
}

impl CustomPropertiesView<'_> {
    /// Every field error in display order.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.primary
            .iter()
            .chain(self.optional.iter())
            .flatten()
            .flat_map(|row| row.name_error.iter().chain(row.error.iter()))
    }

    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }
}

pub(crate) struct ViewInputs<'a, 'c> {
    pub catalogue: &'c Catalogue,
    pub state: &'a EditorState,
    pub values: &'a PropertyValues,
    pub all_values: &'a Value,
    pub root: &'a FieldPath,
    pub decimal: &'a DecimalFormat,
}

impl<'c> ViewInputs<'_, 'c> {
    fn row(
        &self,
        definition: Option<&'c CustomPropertyDefinition>,
        row_index: Option<usize>,
        number: Option<usize>,
    ) -> PropertyRow<'c> {
        let entry = definition
            .and_then(|d| read_entry(self.values, &d.value))
            .unwrap_or_default();
        let value_path = definition.map(|d| entry_path(self.root, &d.value).child("value"));
        let error = definition.and_then(|d| {
            let value = entry.value.clone().unwrap_or(Value::Null);
            let meta = FieldMeta::new(value_path.as_ref().map(ToString::to_string).unwrap_or_default());
            PropertyValidator::new(d, self.root, self.decimal).validate(&value, self.all_values, &meta)
        });
        let optional_row = number.is_some();

        PropertyRow {
            definition,
            internal: definition.is_some_and(|d| entry.effective_internal(d)),
            available_for_rename: match row_index {
                Some(i) if optional_row => rename_targets(self.catalogue, self.state, self.values, i),
                _ => Vec::new(),
            },
            deletable: optional_row,
            name_error: (optional_row && definition.is_none())
                .then_some(ValidationError::MissingRequiredValue),
            entry,
            row_index,
            number,
            value_path,
            error,
        }
    }

    pub fn build(
        &self,
        primary_section_label: &str,
        optional_section_label: &str,
        translation_key: &str,
    ) -> CustomPropertiesView<'c> {
        let position = |value: &str| {
            self.state
                .rows()
                .iter()
                .position(|r| r.as_deref() == Some(value))
        };

        let primary = self.catalogue.has_primary().then(|| {
            self.catalogue
                .primary()
                .map(|d| self.row(Some(d), position(&d.value), None))
                .collect()
        });

        let optional = self.catalogue.has_optional().then(|| {
            self.state
                .rows()
                .iter()
                .enumerate()
                .filter_map(|(i, r)| match r.as_deref() {
                    None => Some((i, None)),
                    Some(value) => match self.catalogue.get(value) {
                        Some(d) if d.primary => None,
                        Some(d) => Some((i, Some(d))),
                        None => None,
                    },
                })
                .enumerate()
                .map(|(n, (i, d))| self.row(d, Some(i), Some(n + 1)))
                .collect()
        });

        CustomPropertiesView {
            primary,
            optional,
            can_add_row: self.catalogue.has_optional(),
            primary_section_label: primary_section_label.to_string(),
            optional_section_label: optional_section_label.to_string(),
            translation_key: translation_key.to_string(),
        }
    }
}
