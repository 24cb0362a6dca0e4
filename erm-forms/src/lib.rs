//! Form editing core for resource records
//!
//! `erm-forms` keeps editable lists in step with a form-state container and
//! validates what users type into them. It renders nothing: every operation
//! is a synchronous state transition over a `serde_json::Value` tree, and
//! renderers consume plain view models.
//!
//! # Architecture
//!
//! - **Container owns values**: [`FormState`] is the single source of truth;
//!   controllers write back through `set`, which dirties the form
//! - **Field arrays**: [`FieldArray`] appends and deletes records at a path,
//!   renumbering rows and keeping a stable key per row
//! - **Custom properties**: [`CustomPropertyEditor`] maps a
//!   [`Catalogue`](erm_fields::Catalogue) onto rows via a pure reducer
//! - **Validators are values**: validators return `Option<ValidationError>`
//!   and chain with [`compose`]

pub mod config;
pub mod custom_properties;
pub mod documents;
pub mod error;
pub mod field_array;
pub mod form_state;
pub mod logging;
pub mod path;
pub mod validators;

pub use config::FormsConfig;
pub use custom_properties::{
    Action, CustomPropertiesView, CustomPropertyEditor, CustomPropertyEntry, EditorState,
    EntryPatch, Phase, PropertyRow,
};
pub use documents::{url_validator, validate_doc_is_specified, validate_document, Document};
pub use error::{FormsError, Result};
pub use field_array::{FieldArray, FieldArrayRow, FieldArrayView};
pub use form_state::{FormState, MemoryFormState};
pub use logging::Pretty;
pub use path::{FieldPath, Segment};
pub use validators::{
    compose, compose_with_args, ComposePolicy, Composed, FieldMeta, ValidationError, Validator,
};
