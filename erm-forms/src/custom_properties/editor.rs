//! The custom property editor bound to a form-state container.

use erm_fields::Catalogue;
use serde_json::Value;
use tracing::debug;

use super::entry::{read_entry, EntryPatch, PropertyValues};
use super::reducer::{reduce, Action, Transition};
use super::state::EditorState;
use super::validate::{DecimalFormat, PropertyValidator};
use super::view::{CustomPropertiesView, ViewInputs};
use crate::config::FormsConfig;
use crate::error::Result;
use crate::form_state::FormState;
use crate::logging::Pretty;
use crate::path::FieldPath;
use crate::validators::{FieldMeta, ValidationError, Validator};

/// Maps a catalogue of definitions onto editable rows of one form.
///
/// The editor keeps only the working list of rows. Entry values live in the
/// container under the configured root and are replaced as a whole map on
/// every change, so one action is one `set`.
///
/// ```rust
/// use erm_fields::{Catalogue, CustomPropertyDefinition, PropertyType};
/// use erm_forms::{CustomPropertyEditor, FormState, FormsConfig, MemoryFormState};
/// use serde_json::json;
///
/// let catalogue = Catalogue::new(vec![
///     CustomPropertyDefinition::new("authIP", "Auth IP", PropertyType::Text),
/// ])?;
/// let mut form = MemoryFormState::new(json!({}));
/// let mut editor = CustomPropertyEditor::bind(catalogue, &FormsConfig::default(), &form)?;
///
/// editor.on_add_row(&mut form);
/// editor.on_rename(&mut form, 0, "authIP");
/// editor.on_change_value(&mut form, "authIP", Some(json!("10.0.0.1")));
///
/// assert_eq!(form.values(), &json!({ "customProperties": { "authIP": [{ "value": "10.0.0.1" }] } }));
/// # Ok::<(), erm_forms::FormsError>(())
/// ```
#[derive(Debug)]
pub struct CustomPropertyEditor {
    catalogue: Catalogue,
    root: FieldPath,
    config: FormsConfig,
    decimal: DecimalFormat,
    state: EditorState,
}

impl CustomPropertyEditor {
    /// Create an editor that has not seen any form values yet.
    pub fn new(catalogue: Catalogue, config: &FormsConfig) -> Result<Self> {
        Ok(Self {
            root: FieldPath::parse(&config.custom_properties_name)?,
            decimal: DecimalFormat::new(config.max_decimal_places)?,
            config: config.clone(),
            catalogue,
            state: EditorState::new(),
        })
    }

    /// Create an editor and derive its rows from `form`.
    pub fn bind<S: FormState + ?Sized>(
        catalogue: Catalogue,
        config: &FormsConfig,
        form: &S,
    ) -> Result<Self> {
        let mut editor = Self::new(catalogue, config)?;
        editor.observe(form);
        Ok(editor)
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn root(&self) -> &FieldPath {
        &self.root
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    fn values<S: FormState + ?Sized>(&self, form: &S) -> PropertyValues {
        form.get(&self.root)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Reconcile the working list with the container.
    ///
    /// Call whenever the container's values may have changed from outside,
    /// e.g. when defaults arrive after the form was first shown.
    pub fn observe<S: FormState + ?Sized>(&mut self, form: &S) {
        let values = self.values(form);
        let state = std::mem::take(&mut self.state);
        self.state = state.reconciled(&self.catalogue, &values, form.pristine());
    }

    /// Run one action and write any resulting values back to `form`.
    pub fn dispatch<S: FormState + ?Sized>(&mut self, form: &mut S, action: Action) {
        debug!("custom property action: {}", Pretty(&action));
        let values = self.values(form);
        let Transition { state, values } =
            reduce(std::mem::take(&mut self.state), action, &self.catalogue, &values);
        self.state = state;
        if let Some(values) = values {
            form.set(&self.root, Value::Object(values));
        }
        debug!(
            rows = self.state.len(),
            phase = ?self.state.phase(),
            dirtying = self.state.dirtying(),
            "custom property editor updated"
        );
        self.observe(form);
    }

    pub fn on_add_row<S: FormState + ?Sized>(&mut self, form: &mut S) {
        self.dispatch(form, Action::AddRow);
    }

    pub fn on_delete<S: FormState + ?Sized>(&mut self, form: &mut S, index: usize) {
        self.dispatch(form, Action::DeleteRow { index });
    }

    pub fn on_rename<S: FormState + ?Sized>(&mut self, form: &mut S, index: usize, definition: &str) {
        self.dispatch(
            form,
            Action::Rename {
                index,
                definition: definition.to_string(),
            },
        );
    }

    pub fn on_change_value<S: FormState + ?Sized>(
        &mut self,
        form: &mut S,
        definition: &str,
        value: Option<Value>,
    ) {
        self.edit(form, definition, EntryPatch::Value(value));
    }

    pub fn on_change_note<S: FormState + ?Sized>(
        &mut self,
        form: &mut S,
        definition: &str,
        note: Option<String>,
    ) {
        self.edit(form, definition, EntryPatch::Note(note));
    }

    pub fn on_change_public_note<S: FormState + ?Sized>(
        &mut self,
        form: &mut S,
        definition: &str,
        note: Option<String>,
    ) {
        self.edit(form, definition, EntryPatch::PublicNote(note));
    }

    pub fn on_change_internal<S: FormState + ?Sized>(
        &mut self,
        form: &mut S,
        definition: &str,
        internal: Option<bool>,
    ) {
        self.edit(form, definition, EntryPatch::Internal(internal));
    }

    fn edit<S: FormState + ?Sized>(&mut self, form: &mut S, definition: &str, patch: EntryPatch) {
        self.dispatch(
            form,
            Action::EditField {
                definition: definition.to_string(),
                patch,
            },
        );
    }

    /// Validate the stored value of `definition`, independently of any view.
    pub fn validate<S: FormState + ?Sized>(&self, definition: &str, form: &S) -> Option<ValidationError> {
        let def = self.catalogue.get(definition)?;
        let value = read_entry(&self.values(form), definition)
            .and_then(|e| e.value)
            .unwrap_or(Value::Null);
        let meta = FieldMeta::new(format!("{}.{}[0].value", self.root, definition));
        PropertyValidator::new(def, &self.root, &self.decimal).validate(&value, form.values(), &meta)
    }

    /// Build the view model for one render.
    pub fn view<'s, S: FormState + ?Sized>(&'s self, form: &S) -> CustomPropertiesView<'s> {
        let values = self.values(form);
        ViewInputs {
            catalogue: &self.catalogue,
            state: &self.state,
            values: &values,
            all_values: form.values(),
            root: &self.root,
            decimal: &self.decimal,
        }
        .build(
            &self.config.primary_section_label,
            &self.config.optional_section_label,
            &self.config.translation_key,
        )
    }

    /// Start a new session: forget local edits and re-derive from `form`.
    pub fn reset<S: FormState + ?Sized>(&mut self, form: &S) {
        debug!("custom property editor reset");
        self.state = EditorState::new();
        self.observe(form);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form_state::MemoryFormState;
    use crate::custom_properties::state::Phase;
    use erm_fields::{CustomPropertyDefinition, PropertyType};
    use serde_json::json;

    fn catalogue() -> Catalogue {
        Catalogue::new(vec![
            CustomPropertyDefinition::new("seats", "Seats", PropertyType::Number).primary(),
            CustomPropertyDefinition::new("authIP", "Auth IP", PropertyType::Text),
            CustomPropertyDefinition::new("fee", "Fee", PropertyType::Decimal),
        ])
        .unwrap()
    }

    fn editor(form: &MemoryFormState) -> CustomPropertyEditor {
        CustomPropertyEditor::bind(catalogue(), &FormsConfig::default(), form).unwrap()
    }

    #[test]
    fn late_defaults_populate_rows() {
        let mut form = MemoryFormState::default();
        let mut editor = editor(&form);
        assert!(editor.state().is_empty());

        form.initialize(json!({ "customProperties": { "authIP": [{ "value": "x" }] } }));
        editor.observe(&form);
        assert_eq!(editor.state().rows(), &[Some("authIP".to_string())]);
        assert_eq!(editor.state().phase(), Phase::Synced);
    }

    #[test]
    fn add_row_blocks_late_defaults() {
        let mut form = MemoryFormState::default();
        let mut editor = editor(&form);

        editor.on_add_row(&mut form);
        assert!(form.pristine());

        form.initialize(json!({ "customProperties": { "authIP": [{}] } }));
        editor.observe(&form);
        assert_eq!(editor.state().rows(), &[None]);
    }

    #[test]
    fn field_edits_write_one_entry() {
        let mut form = MemoryFormState::new(json!({
            "customProperties": { "authIP": [{ "id": "cp-1", "value": "a" }] }
        }));
        let mut editor = editor(&form);

        editor.on_change_note(&mut form, "authIP", Some("n".into()));
        editor.on_change_internal(&mut form, "authIP", Some(false));

        assert_eq!(
            form.values()["customProperties"]["authIP"],
            json!([{ "id": "cp-1", "value": "a", "note": "n", "internal": false }])
        );
        assert!(!form.pristine());
        assert_eq!(editor.state().phase(), Phase::LocallyEdited);
    }

    #[test]
    fn validate_reads_from_form() {
        let mut form = MemoryFormState::default();
        let mut editor = editor(&form);
        editor.on_change_value(&mut form, "seats", Some(json!("3.5")));
        assert!(matches!(
            editor.validate("seats", &form),
            Some(ValidationError::IntegerOutOfRangeOrNonInteger { .. })
        ));
        editor.on_change_value(&mut form, "seats", Some(json!("4")));
        assert_eq!(editor.validate("seats", &form), None);
        assert_eq!(editor.validate("unknown", &form), None);
    }

    #[test]
    fn reset_starts_new_session() {
        let mut form = MemoryFormState::default();
        let mut editor = editor(&form);
        editor.on_add_row(&mut form);

        form.reset(json!({ "customProperties": { "fee": [{ "value": "1.5" }] } }));
        editor.reset(&form);
        assert_eq!(editor.state().rows(), &[Some("fee".to_string())]);
        assert!(!editor.state().dirtying());
    }

    #[test]
    fn custom_root_and_decimal_places() {
        let config = FormsConfig {
            custom_properties_name: "license.customProperties".into(),
            max_decimal_places: 3,
            ..FormsConfig::default()
        };
        let mut form = MemoryFormState::default();
        let mut editor = CustomPropertyEditor::bind(catalogue(), &config, &form).unwrap();

        editor.on_change_value(&mut form, "fee", Some(json!("1.234")));
        assert_eq!(editor.validate("fee", &form), None);
        assert_eq!(
            form.values()["license"]["customProperties"]["fee"],
            json!([{ "value": "1.234" }])
        );
    }

    #[test]
    fn bad_root_is_rejected() {
        let config = FormsConfig {
            custom_properties_name: "props[".into(),
            ..FormsConfig::default()
        };
        assert!(CustomPropertyEditor::new(catalogue(), &config).is_err());
    }
}
