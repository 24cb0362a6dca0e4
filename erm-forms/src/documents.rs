//! Document rows edited through a [`FieldArray`](crate::FieldArray).
//!
//! A document needs a name, and a named document must point somewhere: a
//! physical location, a URL or an uploaded file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::FieldPath;
use crate::validators::{
    boxed, compose, is_truthy, required, valid_url, Composed, FieldMeta, ValidationError, Validator,
};

/// One document record as stored under the array path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Category refdata value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_upload: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fails when the document a field belongs to has a name but no location,
/// URL or file.
///
/// The row is found from the last index in the field's name, so the same
/// validator serves `docs[0].location` and `docs[3].url`.
pub fn validate_doc_is_specified(
    array: FieldPath,
) -> impl Fn(&Value, &Value, &FieldMeta) -> Option<ValidationError> {
    move |_value: &Value, all_values: &Value, meta: &FieldMeta| {
        let index = meta.path()?.last_index()?;
        let doc = array.index(index).get(all_values)?;
        let populated = |field: &str| doc.get(field).is_some_and(is_truthy);

        let located = populated("fileUpload") || populated("location") || populated("url");
        (populated("name") && !located).then_some(ValidationError::MissingLocationOrUrl)
    }
}

/// The URL field's validator: the location check first, then URL syntax.
pub fn url_validator(array: FieldPath) -> Composed<'static> {
    compose(vec![boxed(validate_doc_is_specified(array)), boxed(valid_url)])
}

/// Field errors of one document row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentErrors {
    pub name: Option<ValidationError>,
    pub location: Option<ValidationError>,
    pub file_upload: Option<ValidationError>,
    pub url: Option<ValidationError>,
}

impl DocumentErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.location.is_none()
            && self.file_upload.is_none()
            && self.url.is_none()
    }
}

/// Run every field validator of the document at `array[index]`.
pub fn validate_document(array: &FieldPath, all_values: &Value, index: usize) -> DocumentErrors {
    let row = array.index(index);
    let field = |name: &str| {
        let path = row.child(name);
        let value = path.get(all_values).cloned().unwrap_or(Value::Null);
        (value, FieldMeta::new(path.to_string()))
    };
    let specified = validate_doc_is_specified(array.clone());

    let (name, name_meta) = field("name");
    let (location, location_meta) = field("location");
    let (file, file_meta) = field("fileUpload");
    let (url, url_meta) = field("url");

    DocumentErrors {
        name: required(&name, all_values, &name_meta),
        location: specified(&location, all_values, &location_meta),
        file_upload: specified(&file, all_values, &file_meta),
        url: url_validator(array.clone()).validate(&url, all_values, &url_meta),
    }
}
